//! Suggested categories and the demo catalog.

use crate::sweet::{NewSweet, Price};

/// Categories offered by the admin forms. Not enforced by the store.
pub const SUGGESTED_CATEGORIES: [&str; 6] = [
    "Chocolate",
    "Gummies",
    "Hard Candy",
    "Pastries",
    "Fudge",
    "Specialty",
];

/// Starter stock for demos and local development.
pub fn demo_catalog() -> Vec<NewSweet> {
    vec![
        NewSweet::new("Chocolate Truffles", "Chocolate", Price::from_cents(250), 50)
            .with_description("Rich, creamy chocolate truffles handcrafted with premium cocoa."),
        NewSweet::new("Rainbow Gummy Bears", "Gummies", Price::from_cents(125), 100)
            .with_description("Colorful fruit-flavored gummy bears loved by kids and adults."),
        NewSweet::new("Vanilla Cupcakes", "Pastries", Price::from_cents(375), 25)
            .with_description("Fluffy vanilla cupcakes topped with buttercream frosting."),
        NewSweet::new("Strawberry Lollipops", "Hard Candy", Price::from_cents(75), 75)
            .with_description("Sweet strawberry-flavored lollipops on a stick."),
        NewSweet::new("Caramel Fudge", "Fudge", Price::from_cents(425), 30)
            .with_description("Smooth caramel fudge squares made with real butter."),
        NewSweet::new("Cotton Candy", "Specialty", Price::from_cents(200), 0)
            .with_description("Light and fluffy cotton candy in various flavors."),
    ]
}
