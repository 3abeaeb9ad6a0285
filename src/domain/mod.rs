mod chat;
mod concept;
mod persona;
mod quiz;
mod request;

pub use chat::{ChatMessage, ChatRole};
pub use concept::{ConceptCategory, ConceptEdge, ConceptGraph, ConceptNode};
pub use persona::Persona;
pub use quiz::{Quiz, QuizItem, QuizScore};
pub use request::{GenerationRequest, Task};
