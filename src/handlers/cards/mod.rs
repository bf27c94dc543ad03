pub mod cards;

pub use cards::{create_card, delete_card, list_cards, view_card};
