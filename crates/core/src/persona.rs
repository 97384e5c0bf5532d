//! Agent personas: named system-instruction profiles.
//!
//! The catalog is built once at startup from the built-in presets plus any
//! personas declared in configuration, and is read-only afterwards.
//! Resolving an unknown identifier never fails: it falls back to the
//! `general` persona.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifier of the fallback persona.
pub const DEFAULT_PERSONA_ID: &str = "general";

/// A named system-level instruction profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPersona {
    /// Lookup key (e.g. "market")
    pub id: String,

    /// Display name shown to users
    pub name: String,

    /// One-line summary of the persona's specialty
    pub description: String,

    /// Instruction text placed at the top of every prompt
    pub system_prompt: String,
}

impl AgentPersona {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

/// The built-in persona presets.
pub fn builtin_personas() -> Vec<AgentPersona> {
    vec![
        AgentPersona::new(
            DEFAULT_PERSONA_ID,
            "General Assistant",
            "All-round assistant for everyday tasks",
            "You are a helpful, capable general-purpose assistant. \
             Be concise, accurate and proactive.",
        ),
        AgentPersona::new(
            "market",
            "Market Analyst",
            "Market research, competitors and go-to-market planning",
            "You are an experienced market analyst. You study competitors, pricing \
             and customer segments, and you turn findings into concrete, \
             actionable recommendations.",
        ),
        AgentPersona::new(
            "coder",
            "Software Engineer",
            "Programming, debugging and code review",
            "You are a senior software engineer. You write correct, idiomatic code, \
             explain trade-offs briefly and point out edge cases.",
        ),
        AgentPersona::new(
            "writer",
            "Copywriter",
            "Drafting, editing and rewriting prose",
            "You are a professional copywriter. You write clear, engaging text \
             adapted to the audience and keep the author's intent.",
        ),
        AgentPersona::new(
            "tutor",
            "Patient Tutor",
            "Step-by-step explanations for learners",
            "You are a patient tutor. You explain concepts step by step, check \
             understanding and use simple examples.",
        ),
    ]
}

/// Immutable lookup table of personas.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    personas: Vec<AgentPersona>,
}

impl PersonaCatalog {
    /// A catalog holding only the built-in presets.
    pub fn builtin() -> Self {
        Self {
            personas: builtin_personas(),
        }
    }

    /// Add personas, replacing built-ins that share an id.
    pub fn with_personas(mut self, extra: impl IntoIterator<Item = AgentPersona>) -> Self {
        for persona in extra {
            match self.personas.iter().position(|p| p.id == persona.id) {
                Some(index) => self.personas[index] = persona,
                None => self.personas.push(persona),
            }
        }
        self
    }

    /// Look up a persona by id, falling back to the default persona.
    pub fn resolve(&self, id: &str) -> &AgentPersona {
        if let Some(persona) = self.get(id) {
            return persona;
        }
        debug!(persona = id, "Unknown persona, using default");
        self.default_persona()
    }

    pub fn get(&self, id: &str) -> Option<&AgentPersona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn default_persona(&self) -> &AgentPersona {
        // The default id is a built-in and with_personas only replaces, so it is always present.
        self.personas
            .iter()
            .find(|p| p.id == DEFAULT_PERSONA_ID)
            .unwrap_or(&self.personas[0])
    }

    pub fn list(&self) -> &[AgentPersona] {
        &self.personas
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_persona() {
        let catalog = PersonaCatalog::builtin();
        let persona = catalog.resolve("market");
        assert_eq!(persona.id, "market");
        assert_eq!(persona.name, "Market Analyst");
    }

    #[test]
    fn unknown_persona_falls_back_to_general() {
        let catalog = PersonaCatalog::builtin();
        assert_eq!(catalog.resolve("astronaut").id, DEFAULT_PERSONA_ID);
        assert_eq!(catalog.resolve("").id, DEFAULT_PERSONA_ID);
    }

    #[test]
    fn configured_personas_extend_and_override() {
        let catalog = PersonaCatalog::builtin().with_personas(vec![
            AgentPersona::new("legal", "Legal Advisor", "Contracts", "You review contracts."),
            AgentPersona::new("general", "Custom Default", "Override", "You are terse."),
        ]);

        assert_eq!(catalog.resolve("legal").name, "Legal Advisor");
        assert_eq!(catalog.resolve("unknown").name, "Custom Default");
        assert_eq!(catalog.list().len(), builtin_personas().len() + 1);
    }

    #[test]
    fn builtin_ids_are_unique() {
        let personas = builtin_personas();
        for (i, p) in personas.iter().enumerate() {
            assert!(personas[i + 1..].iter().all(|q| q.id != p.id), "duplicate id {}", p.id);
        }
    }
}
