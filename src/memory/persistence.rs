use super::store::ArtifactSet;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const ARTIFACTS_FILE: &str = "artifacts.json";
pub const SOURCE_FILE: &str = "source.txt";

pub struct ArtifactLoader;

impl ArtifactLoader {
    /// Returns the stored source text and artifact set.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<(String, ArtifactSet)> {
        let dir = dir.as_ref();
        let path = dir.join(ARTIFACTS_FILE);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("unable to read artifacts from {:?}", path))?;
        let artifacts: ArtifactSet = serde_json::from_str(&data)
            .with_context(|| format!("invalid artifacts JSON in {:?}", path))?;
        let source_path = dir.join(SOURCE_FILE);
        let source = fs::read_to_string(&source_path)
            .with_context(|| format!("unable to read source text from {:?}", source_path))?;
        Ok((source, artifacts))
    }
}

pub struct ArtifactWriter;

impl ArtifactWriter {
    /// Writes the full set plus one plain file per ready artifact.
    pub fn save_to_dir(dir: impl AsRef<Path>, source_text: &str, artifacts: &ArtifactSet) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("unable to create output directory {:?}", dir))?;

        write_file(&dir.join(ARTIFACTS_FILE), &serde_json::to_string_pretty(artifacts)?)?;
        write_file(&dir.join(SOURCE_FILE), source_text)?;
        if let Some(graph) = artifacts.graph.ready() {
            write_file(&dir.join("graph.json"), &serde_json::to_string_pretty(graph)?)?;
        }
        if let Some(quiz) = artifacts.quiz.ready() {
            write_file(&dir.join("quiz.json"), &serde_json::to_string_pretty(quiz)?)?;
        }
        if let Some(summary) = artifacts.summary_text() {
            write_file(&dir.join("summary.txt"), summary)?;
        }
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("unable to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConceptGraph, ConceptNode, Persona, Quiz, QuizItem};
    use crate::error::ErrorKind;
    use crate::ingestion::ValidationReport;
    use crate::memory::{ArtifactFailure, ArtifactSlot};
    use chrono::Utc;

    #[test]
    fn save_then_load_restores_the_set() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactSet {
            graph: ArtifactSlot::Ready(ConceptGraph::new(vec![ConceptNode::core("A", "A")], vec![])),
            quiz: ArtifactSlot::Ready(Quiz::new(vec![QuizItem::new("Q", ["a", "b"], "a")])),
            summary: ArtifactSlot::Failed(ArtifactFailure {
                kind: ErrorKind::Service,
                message: "quota".into(),
            }),
            persona: Persona::Expert,
            generated_at: Utc::now(),
            report: ValidationReport::default(),
        };
        ArtifactWriter::save_to_dir(dir.path(), "source", &artifacts).unwrap();

        assert!(dir.path().join("graph.json").exists());
        assert!(dir.path().join("quiz.json").exists());
        assert!(!dir.path().join("summary.txt").exists());

        let (source, loaded) = ArtifactLoader::load_from_dir(dir.path()).unwrap();
        assert_eq!(source, "source");
        assert_eq!(loaded, artifacts);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ArtifactLoader::load_from_dir(dir.path().join("nope")).is_err());
    }
}
