use chrono::{Datelike, NaiveDate};

use crate::db::entities::contact;

pub const BIRTHDAY_WINDOW_DAYS: i64 = 7;

/// Contacts whose next birthday falls on one of the seven days starting today.
///
/// `today + 7` is outside the window: on 2024-06-01 a 06-08
/// birthday is not upcoming. Input order is kept. Returns `None` when nothing matches, including an empty input.
pub fn upcoming_birthdays(
    contacts: impl IntoIterator<Item = contact::Model>,
    today: NaiveDate,
) -> Option<Vec<contact::Model>> {
    let upcoming: Vec<contact::Model> = contacts
        .into_iter()
        .filter(|contact| is_upcoming(contact.birthday, today))
        .collect();

    (!upcoming.is_empty()).then_some(upcoming)
}

fn is_upcoming(birthday: NaiveDate, today: NaiveDate) -> bool {
    let mut delta = (anchor(birthday, today.year()) - today).num_days();
    if delta < 0 {
        delta = (anchor(birthday, today.year() + 1) - today).num_days();
    }
    (0..BIRTHDAY_WINDOW_DAYS).contains(&delta)
}

/// Moves `birthday` onto `year`. Feb 29 lands on Feb 28 in non-leap years.
fn anchor(birthday: NaiveDate, year: i32) -> NaiveDate {
    birthday
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
        .unwrap_or(birthday)
}
