//! Writers for serializing document-backend objects into Automerge documents.
//!
//! Each object is stored at root[key], replacing whatever was there.

use automerge::{transaction::Transactable, AutoCommit, AutomergeError, ObjType, ReadDoc, ROOT};

use super::schema::{BabyObject, QuestionObject, SleepObject};

pub fn write_baby(doc: &mut AutoCommit, baby: &BabyObject) -> Result<(), AutomergeError> {
    let obj = doc.put_object(ROOT, &baby.id, ObjType::Map)?;

    doc.put(&obj, "_id", baby.id.as_str())?;
    doc.put(&obj, "_creationTime", baby.creation_time)?;
    doc.put(&obj, "name", baby.name.as_str())?;
    doc.put(&obj, "ownerId", baby.owner_id.as_str())?;
    doc.put(&obj, "updatedAt", baby.updated_at)?;

    if let Some(ref date) = baby.birth_date {
        doc.put(&obj, "birthDate", date.as_str())?;
    }
    if let Some(ref date) = baby.due_date {
        doc.put(&obj, "dueDate", date.as_str())?;
    }
    if let Some(ref sex) = baby.sex {
        doc.put(&obj, "sex", sex.as_str())?;
    }
    if let Some(ref url) = baby.photo_url {
        doc.put(&obj, "photoUrl", url.as_str())?;
    }

    let members = doc.put_object(&obj, "memberIds", ObjType::List)?;
    for (i, member) in baby.member_ids.iter().enumerate() {
        doc.insert(&members, i, member.as_str())?;
    }

    Ok(())
}

pub fn write_sleep_entry(doc: &mut AutoCommit, entry: &SleepObject) -> Result<(), AutomergeError> {
    let obj = doc.put_object(ROOT, &entry.id, ObjType::Map)?;

    doc.put(&obj, "_id", entry.id.as_str())?;
    doc.put(&obj, "_creationTime", entry.creation_time)?;
    doc.put(&obj, "babyId", entry.baby_id.as_str())?;
    doc.put(&obj, "userId", entry.user_id.as_str())?;
    doc.put(&obj, "startTime", entry.start_time)?;

    if let Some(end) = entry.end_time {
        doc.put(&obj, "endTime", end)?;
    }
    if let Some(minutes) = entry.duration_minutes {
        doc.put(&obj, "durationMinutes", minutes)?;
    }
    if let Some(ref notes) = entry.notes {
        doc.put(&obj, "notes", notes.as_str())?;
    }

    Ok(())
}

pub fn write_question(doc: &mut AutoCommit, question: &QuestionObject) -> Result<(), AutomergeError> {
    let obj = doc.put_object(ROOT, &question.id, ObjType::Map)?;

    doc.put(&obj, "_id", question.id.as_str())?;
    doc.put(&obj, "_creationTime", question.creation_time)?;
    doc.put(&obj, "clientRef", question.client_ref.as_str())?;
    doc.put(&obj, "userId", question.user_id.as_str())?;
    doc.put(&obj, "question", question.question.as_str())?;

    if let Some(ref answer) = question.answer {
        doc.put(&obj, "answer", answer.as_str())?;
    }
    if let Some(ref category) = question.category {
        doc.put(&obj, "category", category.as_str())?;
    }
    if let Some(at) = question.answered_at {
        doc.put(&obj, "answeredAt", at)?;
    }

    Ok(())
}

/// Removes root[key]. Returns false if there was nothing to remove.
pub fn delete_record(doc: &mut AutoCommit, key: &str) -> Result<bool, AutomergeError> {
    if doc.get(ROOT, key)?.is_none() {
        return Ok(false);
    }
    doc.delete(ROOT, key)?;
    Ok(true)
}
