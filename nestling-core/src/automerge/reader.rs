//! Readers that pull document-backend objects out of Automerge documents.
//!
//! Objects missing a required field are skipped rather than failing the
//! whole read, so one malformed record does not hide the rest.

use automerge::{AutoCommit, ObjId, ReadDoc, Value, ROOT};

use super::schema::{BabyObject, QuestionObject, SleepObject};

#[derive(Debug)]
pub enum ReaderError {
    /// Automerge operation failed.
    AutomergeError(String),
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderError::AutomergeError(e) => write!(f, "Automerge error: {}", e),
        }
    }
}

impl std::error::Error for ReaderError {}

impl From<automerge::AutomergeError> for ReaderError {
    fn from(e: automerge::AutomergeError) -> Self {
        ReaderError::AutomergeError(e.to_string())
    }
}

/// Reads every object in a collection document through `read`.
fn read_all<T>(
    doc: &AutoCommit,
    read: impl Fn(&AutoCommit, &ObjId, &str) -> Result<Option<T>, ReaderError>,
) -> Result<Vec<T>, ReaderError> {
    let mut objects = Vec::new();

    for key in doc.keys(ROOT) {
        if let Some((Value::Object(_), obj_id)) = doc.get(ROOT, &key)? {
            if let Some(object) = read(doc, &obj_id, &key)? {
                objects.push(object);
            }
        }
    }

    Ok(objects)
}

fn read_one<T>(
    doc: &AutoCommit,
    key: &str,
    read: impl Fn(&AutoCommit, &ObjId, &str) -> Result<Option<T>, ReaderError>,
) -> Result<Option<T>, ReaderError> {
    match doc.get(ROOT, key)? {
        Some((Value::Object(_), obj_id)) => read(doc, &obj_id, key),
        _ => Ok(None),
    }
}

// =============================================================================
// Babies
// =============================================================================

pub fn read_all_babies(doc: &AutoCommit) -> Result<Vec<BabyObject>, ReaderError> {
    read_all(doc, read_baby)
}

pub fn read_baby_by_key(doc: &AutoCommit, key: &str) -> Result<Option<BabyObject>, ReaderError> {
    read_one(doc, key, read_baby)
}

fn read_baby(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<BabyObject>, ReaderError> {
    let name = match get_string(doc, obj_id, "name")? {
        Some(n) => n,
        None => return Ok(None),
    };
    let owner_id = match get_string(doc, obj_id, "ownerId")? {
        Some(o) => o,
        None => return Ok(None),
    };
    let creation_time = get_i64(doc, obj_id, "_creationTime")?.unwrap_or(0);

    Ok(Some(BabyObject {
        id: key.to_string(),
        creation_time,
        name,
        birth_date: get_string(doc, obj_id, "birthDate")?,
        due_date: get_string(doc, obj_id, "dueDate")?,
        sex: get_string(doc, obj_id, "sex")?,
        photo_url: get_string(doc, obj_id, "photoUrl")?,
        owner_id,
        member_ids: read_string_list(doc, obj_id, "memberIds")?,
        updated_at: get_i64(doc, obj_id, "updatedAt")?.unwrap_or(creation_time),
    }))
}

// =============================================================================
// Sleep entries
// =============================================================================

pub fn read_all_sleep_entries(doc: &AutoCommit) -> Result<Vec<SleepObject>, ReaderError> {
    read_all(doc, read_sleep_entry)
}

pub fn read_sleep_entry_by_key(
    doc: &AutoCommit,
    key: &str,
) -> Result<Option<SleepObject>, ReaderError> {
    read_one(doc, key, read_sleep_entry)
}

fn read_sleep_entry(
    doc: &AutoCommit,
    obj_id: &ObjId,
    key: &str,
) -> Result<Option<SleepObject>, ReaderError> {
    let baby_id = match get_string(doc, obj_id, "babyId")? {
        Some(b) => b,
        None => return Ok(None),
    };
    let start_time = match get_i64(doc, obj_id, "startTime")? {
        Some(s) => s,
        None => return Ok(None),
    };

    Ok(Some(SleepObject {
        id: key.to_string(),
        creation_time: get_i64(doc, obj_id, "_creationTime")?.unwrap_or(start_time),
        baby_id,
        user_id: get_string(doc, obj_id, "userId")?.unwrap_or_default(),
        start_time,
        end_time: get_i64(doc, obj_id, "endTime")?,
        duration_minutes: get_i64(doc, obj_id, "durationMinutes")?,
        notes: get_string(doc, obj_id, "notes")?,
    }))
}

// =============================================================================
// Doctor questions
// =============================================================================

pub fn read_all_questions(doc: &AutoCommit) -> Result<Vec<QuestionObject>, ReaderError> {
    read_all(doc, read_question)
}

/// Finds a question by the caller-minted reference shared across backends.
pub fn find_question_by_client_ref(
    doc: &AutoCommit,
    client_ref: &str,
) -> Result<Option<QuestionObject>, ReaderError> {
    Ok(read_all_questions(doc)?
        .into_iter()
        .find(|q| q.client_ref == client_ref))
}

fn read_question(
    doc: &AutoCommit,
    obj_id: &ObjId,
    key: &str,
) -> Result<Option<QuestionObject>, ReaderError> {
    let client_ref = match get_string(doc, obj_id, "clientRef")? {
        Some(c) => c,
        None => return Ok(None),
    };
    let question = match get_string(doc, obj_id, "question")? {
        Some(q) => q,
        None => return Ok(None),
    };

    Ok(Some(QuestionObject {
        id: key.to_string(),
        creation_time: get_i64(doc, obj_id, "_creationTime")?.unwrap_or(0),
        client_ref,
        user_id: get_string(doc, obj_id, "userId")?.unwrap_or_default(),
        question,
        answer: get_string(doc, obj_id, "answer")?,
        category: get_string(doc, obj_id, "category")?,
        answered_at: get_i64(doc, obj_id, "answeredAt")?,
    }))
}

// =============================================================================
// Field helpers
// =============================================================================

fn get_string(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<String>, ReaderError> {
    if let Some((value, _)) = doc.get(obj_id, key)? {
        Ok(value.into_string().ok())
    } else {
        Ok(None)
    }
}

fn get_i64(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<i64>, ReaderError> {
    if let Some((value, _)) = doc.get(obj_id, key)? {
        Ok(value.to_i64())
    } else {
        Ok(None)
    }
}

fn read_string_list(
    doc: &AutoCommit,
    obj_id: &ObjId,
    key: &str,
) -> Result<Vec<String>, ReaderError> {
    let mut result = Vec::new();

    if let Some((Value::Object(_), list_id)) = doc.get(obj_id, key)? {
        for i in 0..doc.length(&list_id) {
            if let Some((value, _)) = doc.get(&list_id, i)? {
                if let Ok(s) = value.into_string() {
                    result.push(s);
                }
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automerge::writer::{write_question, write_sleep_entry};
    use automerge::{transaction::Transactable, ObjType};

    #[test]
    fn test_read_sleep_entry_written_by_writer() {
        let mut doc = AutoCommit::new();
        let object = SleepObject {
            id: "k1".to_string(),
            creation_time: 5_000,
            baby_id: "b1".to_string(),
            user_id: "mum".to_string(),
            start_time: 1_000,
            end_time: Some(61_000),
            duration_minutes: Some(1),
            notes: None,
        };
        write_sleep_entry(&mut doc, &object).unwrap();

        assert_eq!(read_sleep_entry_by_key(&doc, "k1").unwrap(), Some(object));
        assert_eq!(read_sleep_entry_by_key(&doc, "k2").unwrap(), None);
    }

    #[test]
    fn test_malformed_objects_are_skipped() {
        let mut doc = AutoCommit::new();
        let obj = doc.put_object(ROOT, "broken", ObjType::Map).unwrap();
        doc.put(&obj, "userId", "mum").unwrap();
        doc.put(ROOT, "scalar", "not an object").unwrap();

        assert!(read_all_sleep_entries(&doc).unwrap().is_empty());
        assert!(read_all_babies(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_find_question_by_client_ref() {
        let mut doc = AutoCommit::new();
        for (key, client_ref) in [("k1", "ref-1"), ("k2", "ref-2")] {
            write_question(
                &mut doc,
                &QuestionObject {
                    id: key.to_string(),
                    creation_time: 0,
                    client_ref: client_ref.to_string(),
                    user_id: "mum".to_string(),
                    question: "?".to_string(),
                    answer: None,
                    category: None,
                    answered_at: None,
                },
            )
            .unwrap();
        }

        let found = find_question_by_client_ref(&doc, "ref-2").unwrap().unwrap();
        assert_eq!(found.id, "k2");
        assert!(find_question_by_client_ref(&doc, "ref-3").unwrap().is_none());
    }
}
