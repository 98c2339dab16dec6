//! Random activity names for the "🎲 Random 🎲" shortcut

use rand::seq::SliceRandom;
use std::sync::Arc;

const ADJECTIVES: &[&str] = &[
    "Sunny", "Lazy", "Brave", "Quiet", "Wild", "Golden", "Cosy", "Epic", "Secret", "Swift",
    "Merry", "Misty", "Bold", "Gentle", "Lucky", "Rusty", "Silver", "Sleepy", "Spicy", "Windy",
];

const NOUNS: &[&str] = &[
    "Picnic", "Hike", "Brunch", "Quest", "Workout", "Cleanup", "Movie Night", "Road Trip",
    "Barbecue", "Game Night", "Bike Ride", "Book Club", "Jam Session", "Karaoke", "Swim",
    "Potluck", "Marathon", "Cook-off", "Stargazing", "Escape Room",
];

/// Source of candidate activity names
pub trait NameGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<T: NameGenerator + ?Sized> NameGenerator for Arc<T> {
    fn generate(&self) -> String {
        (**self).generate()
    }
}

/// Adjective + noun, e.g. "Sunny Picnic"
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNameGenerator;

impl NameGenerator for RandomNameGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Mystery");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Activity");
        format!("{adjective} {noun}")
    }
}
