mod baby;
mod doctor_question;
mod record_id;
mod sex;
mod sleep_entry;

pub use baby::{Baby, BabyPatch, NewBaby};
pub use doctor_question::{DoctorQuestion, NewDoctorQuestion};
pub use record_id::RecordId;
pub use sex::Sex;
pub use sleep_entry::{NewSleepEntry, SleepEntry, SleepPatch, SleepState};
