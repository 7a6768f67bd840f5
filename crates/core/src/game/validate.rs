//! Field validation for games created or edited by hand.

use super::{GameUpdate, NewGame};

/// Validate a manual creation request.
pub fn validate_new_game(game: &NewGame) -> Result<(), String> {
    validate_fields(Some(&game.name), game.rating, game.metacritic)?;
    if let Some(external_id) = game.external_id {
        if external_id <= 0 {
            return Err(format!("external_id must be positive, got {}", external_id));
        }
    }
    Ok(())
}

/// Validate a partial update. Only present fields are checked.
pub fn validate_update(update: &GameUpdate) -> Result<(), String> {
    validate_fields(update.name.as_deref(), update.rating, update.metacritic)
}

fn validate_fields(
    name: Option<&str>,
    rating: Option<f64>,
    metacritic: Option<u32>,
) -> Result<(), String> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err("name is required".to_string());
        }
    }
    if let Some(rating) = rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(format!("rating must be between 0 and 5, got {}", rating));
        }
    }
    if let Some(metacritic) = metacritic {
        if metacritic > 100 {
            return Err(format!(
                "metacritic must be between 0 and 100, got {}",
                metacritic
            ));
        }
    }
    Ok(())
}
