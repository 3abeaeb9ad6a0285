use anyhow::{self, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Neutral,
    Beginner,
    Expert,
}

impl Persona {
    pub fn name(self) -> &'static str {
        match self {
            Persona::Neutral => "neutral",
            Persona::Beginner => "beginner",
            Persona::Expert => "expert",
        }
    }

    /// Tone directive embedded in every instruction.
    pub fn style_directive(self) -> &'static str {
        match self {
            Persona::Beginner => concat!(
                "Explain as if to a complete beginner: use simple words, short sentences ",
                "and everyday analogies for every abstract idea."
            ),
            Persona::Expert => concat!(
                "Write for a domain expert: use precise technical terminology and a formal ",
                "register, and do not simplify."
            ),
            Persona::Neutral => "Use a neutral, concise and factual tone.",
        }
    }

    pub fn all() -> &'static [Persona] {
        const ALL: &[Persona] = &[Persona::Neutral, Persona::Beginner, Persona::Expert];
        ALL
    }
}

impl Default for Persona {
    fn default() -> Self {
        Persona::Neutral
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Persona {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let persona = match normalized.as_str() {
            "" | "neutral" | "default" | "standard" => Persona::Neutral,
            "beginner" | "novice" | "eli5" => Persona::Beginner,
            "expert" | "technical" | "advanced" => Persona::Expert,
            _ => anyhow::bail!("unknown persona: {}", s),
        };
        Ok(persona)
    }
}
