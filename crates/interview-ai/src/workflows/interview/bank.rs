use tracing::debug;

use super::domain::{Question, RecordId};
use super::store::records::decode_question;
use super::store::{Collection, RecordStore, StoreError};

/// Snapshot of every known question. Rebuilt, never mutated, when the store is reloaded.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub async fn load<S>(store: &S) -> Result<Self, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        let questions = store
            .list(Collection::Questions)
            .await?
            .iter()
            .map(decode_question)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = questions.len(), "question bank loaded");
        Ok(Self { questions })
    }

    pub fn all_questions(&self) -> &[Question] {
        &self.questions
    }

    /// Distinct domain labels in order of first appearance.
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = Vec::new();
        for question in &self.questions {
            if !domains.contains(&question.domain) {
                domains.push(question.domain.clone());
            }
        }
        domains
    }

    pub fn get(&self, id: RecordId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::interview::domain::Difficulty;
    use crate::workflows::interview::store::MemoryRecordStore;
    use serde_json::json;

    fn question(id: u64, domain: &str) -> Question {
        Question {
            id: RecordId(id),
            prompt: format!("q{id}"),
            reference_answer: String::new(),
            difficulty: Difficulty::Easy,
            domain: domain.to_string(),
        }
    }

    #[test]
    fn domains_follow_first_appearance() {
        let bank = QuestionBank::new(vec![
            question(1, "Frontend"),
            question(2, "Backend"),
            question(3, "Frontend"),
            question(4, "DevOps"),
            question(5, "devops"),
        ]);

        assert_eq!(
            bank.domains(),
            vec!["Frontend", "Backend", "DevOps", "devops"]
        );
        assert_eq!(bank.len(), 5);
        assert_eq!(bank.get(RecordId(4)).map(|q| q.domain.as_str()), Some("DevOps"));
    }

    #[tokio::test]
    async fn load_decodes_question_records() {
        let store = MemoryRecordStore::provisioned();
        store
            .create(
                Collection::Questions,
                json!({
                    "prompt": "What does `?` do?",
                    "answer": "Propagates the error",
                    "difficulty": "easy",
                    "domain": "Rust"
                })
                .as_object()
                .cloned()
                .expect("object literal"),
            )
            .await
            .expect("seed question");

        let bank = QuestionBank::load(&store).await.expect("bank loads");
        assert_eq!(bank.domains(), vec!["Rust"]);
        assert_eq!(bank.all_questions()[0].reference_answer, "Propagates the error");
    }
}
