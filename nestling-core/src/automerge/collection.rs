//! Collections held by the document backend, one Automerge document each.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Babies,
    SleepEntries,
    DoctorQuestions,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Babies,
        Collection::SleepEntries,
        Collection::DoctorQuestions,
    ];

    /// Returns the filename for this collection's document.
    pub fn filename(&self) -> &'static str {
        match self {
            Collection::Babies => "babies.automerge",
            Collection::SleepEntries => "sleep_entries.automerge",
            Collection::DoctorQuestions => "doctor_questions.automerge",
        }
    }
}
