use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Names of game objects (`{Argon}`) and script objects (`[TRUE]`) known to
/// the target game. Without a library every object name is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectLibrary {
    #[serde(default)]
    pub game_objects: BTreeSet<String>,
    #[serde(default)]
    pub script_objects: BTreeSet<String>,
}

impl ObjectLibrary {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn contains_game_object(&self, name: &str) -> bool {
        self.game_objects.contains(name)
    }

    pub fn contains_script_object(&self, name: &str) -> bool {
        self.script_objects.contains(name)
    }
}

#[cfg(test)]
mod objects_tests {
    use super::*;

    #[test]
    fn library_reads_camel_case_json() {
        let library = ObjectLibrary::from_json(
            r#"{"gameObjects":["Argon","Shield"],"scriptObjects":["TRUE"]}"#,
        )
        .expect("library");
        assert!(library.contains_game_object("Argon"));
        assert!(library.contains_script_object("TRUE"));
        assert!(!library.contains_game_object("TRUE"));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let library = ObjectLibrary::from_json("{}").expect("library");
        assert_eq!(library, ObjectLibrary::default());
    }
}
