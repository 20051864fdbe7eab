//! Point-in-time "alive" predicate.

use chrono::NaiveDate;

use crate::model::Person;

/// Default reference date against which people are judged alive (1444-11-11).
pub fn default_cutoff_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1444, 11, 11).expect("1444-11-11 is a valid date")
}

/// Whether `person` counts as alive on `on_date`.
///
/// Alive means born on or before `on_date` and not dead on or before it.
/// Unknown dates are permissive, except that `require_birth` rejects people
/// without a known birth date.
pub fn is_alive_on(person: &Person, on_date: NaiveDate, require_birth: bool) -> bool {
    if require_birth && person.birth.is_none() {
        return false;
    }
    if matches!(person.birth, Some(birth) if birth > on_date) {
        return false;
    }
    if matches!(person.death, Some(death) if death <= on_date) {
        return false;
    }
    true
}
