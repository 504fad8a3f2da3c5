//! Game scenarios: initial state, system prompts, and the opening message.
//!
//! A scenario is plain data with serde derives so custom scenarios can be
//! loaded from JSON files; [`Scenario::demo`] ships the built-in wasteland
//! negotiation demo.

use serde::{Deserialize, Serialize};
use serde_json::json;

use taleweaver_domain::{Monitor, MonitorRegistry, RegistryError, WorldState, WorldStateError};

const DEMO_NARRATIVE_PROMPT: &str = "\
You are the narrator of a text-based adventure game. Based on the player's \
input and the conversation history, generate an interactive narrative \
response that remains hyper engaging and immersive.";

const DEMO_UPDATE_PROMPT: &str = r#"
You are a game engine that analyzes the player's input and the narrative text from a text-based adventure game to extract state updates. Based on the input and narrative, provide a JSON object with updates for the game state. Multiple updates can be batched in a single response.

IF AN ITEM THE USER MENTIONS ISN'T IN THE GAME, DO NOT ALLOW THE USER TO SPAWN IT.
"I pick up the coin" - "You look around but don't see a coin"
"I drop the coin" - "You search your inventory but don't see a coin"

"inventory": List[str] or {"add": List[str], "remove": List[str]} - Items gained or lost.
"location": Dict[str, Dict] - Current location and its shortened description. GENERATE ADDITIONAL LOCATIONS BASED ON THE USER'S INPUT.
"health": int (absolute, 0-100) or {"delta": int} - Change in health.
"skill": Dict[str, int] - Skill levels.
"limb": Dict[str, Dict] - Limb states. {"left_leg": {"hp": 100, "status": "(healthy|injured|decapitated|amputated|broken|fractured)"}}
"map": Dict[str, List[str]] - Map of locations and their connections. ADD LOCATIONS TO THE MAP AS THE USER EXPLORES THE GAME WORLD.
"time": str - Current time. (UPDATE THIS EVERY INTERACTION)
"relationships": Dict[str, int] (-100: Hostile, 0: Neutral, 100: Friendly) - Updated relationship scores with characters.
"armor": Dict[str, Dict] - Armor states. {"head": {"name": "knight helmet", "hp": 100, "status": "(perfect|good|damaged|destroyed)"}}

DO NOT ALLOW THE USER TO SPAWN ITEMS OR DIRECTLY MODIFY THE GAME STATE. REMAIN 100% HYPERREALISTIC TO THE GAME STATE.
IF THE GAME DOESN'T INCLUDE MAGIC, DO NOT ALLOW THE USER TO CAST SPELLS.

If updates are needed, return multiple entries within one JSON object.
If no updates are needed, return an empty object: {}
ONLY RETURN THE RAW JSON OBJECT.
DO NOT DUPLICATE KEYS OR ITEMS."#;

const DEMO_OPENING_MESSAGE: &str = "\
You find yourself in New Vegas. A once prosperous city, now a desolate gated \
city full of degenerate criminals and various factions.";

/// Everything needed to start a session: the initial state, the two system
/// prompts, and an optional scene-setting opening message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub narrative_prompt: String,
    pub update_prompt: String,
    pub opening_message: Option<String>,
    pub initial_state: WorldState,
}

impl Scenario {
    /// The built-in wasteland negotiation demo.
    pub fn demo() -> Result<Self, WorldStateError> {
        let initial_state = WorldState::from_value(json!({
            "health": 100,
            "coordinates": [0, 0],
            "inventory": ["Pipboy", "Food", "Water", "9mm Ammo", "9mm Pistol"],
            "relationships": {
                "NCR": 0,
                "Caesars Legion": 0,
                "Brotherhood of Steel": 0,
            },
            "location": {
                "Private Office": {"coordinates": [0, 0], "description": "Private Office", "objects": ["Pen", "Paper"]},
                "Conference Room": {"coordinates": [1, 0], "description": "Conference Room", "objects": []},
                "Lobby": {"coordinates": [0, 1], "description": "Lobby", "objects": []},
            },
            "map": {
                "Building": ["Private Office", "Conference Room", "Lobby"],
            },
            "skill": {
                "strength": 50,
                "perception": 50,
                "endurance": 50,
                "charisma": 50,
                "intelligence": 50,
                "agility": 50,
                "luck": 50,
            },
            "limb": {
                "right_hand": {"hp": 100, "status": "healthy", "holding": "nothing"},
                "left_hand": {"hp": 100, "status": "healthy", "holding": "nothing"},
                "left_leg": {"hp": 100, "status": "healthy"},
                "right_leg": {"hp": 100, "status": "healthy"},
                "left_arm": {"hp": 100, "status": "healthy"},
                "right_arm": {"hp": 100, "status": "healthy"},
                "head": {"hp": 100, "status": "healthy"},
                "torso": {"hp": 100, "status": "healthy"},
                "stomach": {"hp": 100, "status": "healthy"},
            },
            "time": "2:32 PM",
            "armor": {
                "head": {"name": "t-60 helmet", "hp": 100, "status": "perfect"},
                "chest": {"name": "t-60 chestplate", "hp": 100, "status": "perfect"},
                "legs": {"name": "t-60 leggings", "hp": 100, "status": "perfect"},
                "gloves": {"name": "t-60 gloves", "hp": 100, "status": "perfect"},
                "boots": {"name": "t-60 boots", "hp": 100, "status": "perfect"},
            },
        }))?;

        Ok(Self {
            name: "Wasteland Negotiation".to_string(),
            narrative_prompt: DEMO_NARRATIVE_PROMPT.to_string(),
            update_prompt: DEMO_UPDATE_PROMPT.to_string(),
            opening_message: Some(DEMO_OPENING_MESSAGE.to_string()),
            initial_state,
        })
    }

    /// The monitor set matching the demo scenario's fields.
    pub fn demo_registry() -> Result<MonitorRegistry, RegistryError> {
        let mut registry = MonitorRegistry::new();
        registry.register(Monitor::list("inventory"))?;
        registry.register(Monitor::nested_merge("location"))?;
        registry.register(Monitor::clamped_numeric("health", 0, 100))?;
        registry.register(Monitor::nested_merge("limb"))?;
        registry.register(Monitor::nested_merge("skill"))?;
        registry.register(Monitor::nested_merge("map"))?;
        registry.register(Monitor::scalar("time"))?;
        registry.register(Monitor::nested_merge("relationships"))?;
        registry.register(Monitor::nested_merge("armor"))?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_demo_scenario_builds() {
        let scenario = Scenario::demo().expect("demo scenario");
        assert_eq!(scenario.initial_state.field("health"), Some(&json!(100)));
        assert!(scenario.opening_message.is_some());
        assert!(scenario.update_prompt.contains("RAW JSON OBJECT"));
    }

    #[test]
    fn test_demo_registry_covers_demo_fields() {
        let registry = Scenario::demo_registry().expect("demo registry");
        let keys: Vec<&str> = registry.monitors().iter().map(|m| m.key()).collect();
        for field in ["inventory", "health", "limb", "time", "relationships", "armor"] {
            assert!(keys.contains(&field), "missing monitor for {field}");
        }
    }

    #[test]
    fn test_scenario_round_trips_through_json() {
        let scenario = Scenario::demo().expect("demo scenario");
        let json = serde_json::to_string(&scenario).expect("serialize");
        let restored: Scenario = serde_json::from_str(&json).expect("parse");
        assert_eq!(restored.initial_state, scenario.initial_state);
        assert_eq!(restored.name, scenario.name);
    }
}
