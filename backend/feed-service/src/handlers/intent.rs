use actix_web::{get, HttpResponse};
use serde::Serialize;

/// One selectable lane, energy or mood
#[derive(Debug, Clone, Serialize)]
pub struct IntentOption {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
    pub emoji: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntentsResponse {
    pub lanes: Vec<IntentOption>,
    pub energies: Vec<IntentOption>,
    pub moods: Vec<IntentOption>,
}

const fn option(
    id: &'static str,
    label: &'static str,
    description: &'static str,
    emoji: &'static str,
) -> IntentOption {
    IntentOption {
        id,
        label,
        description,
        emoji,
    }
}

const LANES: [IntentOption; 5] = [
    option("discover", "Discover", "Explore new ideas and perspectives", "🔍"),
    option("debate", "Debate", "Engage in friendly arguments", "⚔️"),
    option("vibe", "Vibe", "Light-hearted fun and entertainment", "✨"),
    option("reflect", "Reflect", "Deep thoughts and introspection", "🪞"),
    option("decide", "Decide", "Help making real choices", "🎯"),
];

const ENERGIES: [IntentOption; 3] = [
    option("chill", "Chill", "Relaxed, low-stakes choices", "😌"),
    option("balanced", "Balanced", "Mix of easy and engaging", "⚖️"),
    option("intense", "Intense", "High-stakes, thought-provoking", "🔥"),
];

const MOODS: [IntentOption; 5] = [
    option("playful", "Playful", "", "😄"),
    option("serious", "Serious", "", "🤔"),
    option("spicy", "Spicy", "", "🌶️"),
    option("wholesome", "Wholesome", "", "💖"),
    option("chaotic", "Chaotic", "", "🌪️"),
];

/// Static catalogue the client uses to build the session picker
pub fn catalogue() -> IntentsResponse {
    IntentsResponse {
        lanes: LANES.to_vec(),
        energies: ENERGIES.to_vec(),
        moods: MOODS.to_vec(),
    }
}

#[get("/intents")]
pub async fn get_intents() -> HttpResponse {
    HttpResponse::Ok().json(catalogue())
}
