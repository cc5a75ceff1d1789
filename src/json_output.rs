use crate::game::*;
use serde_json::*;

// replays use the hanab.live JSON layout
const PLAY: u32 = 0;
const DISCARD: u32 = 1;
const COLOR_CLUE: u32 = 2;
const RANK_CLUE: u32 = 3;
const GAME_OVER: u32 = 4;

fn card_to_json(card: Card, variant: Variant) -> serde_json::Value {
    json!({
        "rank": card.value,
        "suitIndex": variant.color_index(card.color),
    })
}

pub fn action_clue(hint: &Hint, variant: Variant) -> serde_json::Value {
    match hint.hinted {
        Hinted::Color(color) => {
            json!({
                "type": COLOR_CLUE,
                "target": hint.player,
                "value": variant.clue_colors().iter().position(|&c| c == color),
            })
        }
        Hinted::Value(value) => {
            json!({
                "type": RANK_CLUE,
                "target": hint.player,
                "value": value,
            })
        }
    }
}

pub fn action_play(card_id: CardId) -> serde_json::Value {
    json!({
        "type": PLAY,
        "target": card_id,
    })
}

pub fn action_discard(card_id: CardId) -> serde_json::Value {
    json!({
        "type": DISCARD,
        "target": card_id,
    })
}

pub fn action_terminate(player: Player) -> serde_json::Value {
    json!({
        "type": GAME_OVER,
        "target": player,
        // ended by a player
        "value": 4,
    })
}

/// The deck is listed in draw order, so card ids index into it.
pub fn json_format(
    variant: Variant,
    deck: &[Card],
    actions: &[serde_json::Value],
    players: &[String],
) -> serde_json::Value {
    json!({
        "options": {
            "variant": variant.name(),
        },
        "players": players,
        "first_player": 0,
        "notes": players.iter().map(|_| json!([])).collect::<Vec<_>>(),
        "deck": deck
            .iter()
            .map(|&card| card_to_json(card, variant))
            .collect::<Vec<serde_json::Value>>(),
        "actions": actions,
    })
}
