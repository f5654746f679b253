use quiz_core::model::{Difficulty, QuestionId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization("question_id sign overflow".into()))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn difficulty_to_str(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Beginner => "beginner",
        Difficulty::Moderate => "moderate",
        Difficulty::Expert => "expert",
    }
}

pub(crate) fn parse_difficulty(s: &str) -> Result<Difficulty, StorageError> {
    match s {
        "beginner" => Ok(Difficulty::Beginner),
        "moderate" => Ok(Difficulty::Moderate),
        "expert" => Ok(Difficulty::Expert),
        other => Err(StorageError::Serialization(format!(
            "unknown difficulty: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_text_round_trips() {
        for difficulty in Difficulty::ALL {
            assert_eq!(
                parse_difficulty(difficulty_to_str(difficulty)).unwrap(),
                difficulty
            );
        }
        assert!(parse_difficulty("Expert").is_err());
    }

    #[test]
    fn negative_question_id_is_rejected() {
        assert!(question_id_from_i64(-1).is_err());
        assert_eq!(question_id_from_i64(8).unwrap(), QuestionId::new(8));
    }
}
