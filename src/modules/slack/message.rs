use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{BookRecord, Completion, UserBooksMap};
use crate::utils::natural_day;

/// Width of a preformatted line in the chat client.
const RULE_WIDTH: usize = 74;
const USER_COLUMN: usize = 20;
const TITLE_COLUMN: usize = 36;
const TITLE_CUT: usize = 32;
const NO_BOOKS: &str = "no books read yet";

static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^<]+?>").expect("markup pattern is valid"));

pub fn strip_markup(text: &str) -> String {
    MARKUP.replace_all(text, "").into_owned()
}

/// Title, author and page count, then the description as a code block.
pub fn book_message(book: &BookRecord) -> String {
    format!(
        "*{}*\nAuthor: _{}_ (pages: {})\nDescription:\n```{}```",
        book.title,
        book.authors,
        book.pages,
        strip_markup(&book.description)
    )
}

/// Readers table, most recent reader first, readers with nothing completed last.
pub fn user_listing(users: &UserBooksMap, home_url: &str, today: NaiveDate) -> String {
    let mut rows: Vec<(&str, Option<&Completion>)> = users
        .iter()
        .map(|(user, completions)| {
            (
                user.as_str(),
                completions.iter().max_by_key(|c| c.completed),
            )
        })
        .collect();

    // Stable, so equal dates keep username order; `None` sorts below any date.
    rows.sort_by(|a, b| {
        let a = a.1.map(|c| c.completed);
        let b = b.1.map(|c| c.completed);
        b.cmp(&a)
    });

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!(
        "{:<width$}: Last read -> {}",
        "User",
        home_url,
        width = USER_COLUMN
    ));
    lines.push("-".repeat(RULE_WIDTH));

    for (user, last) in rows {
        let user = fit(user, USER_COLUMN);
        match last {
            Some(completion) => lines.push(format!(
                "{}: {} ({})",
                user,
                title_cell(&completion.book.title),
                natural_day(completion.completed.date_naive(), today)
            )),
            None => lines.push(format!("{}: {}", user, NO_BOOKS)),
        }
    }

    format!("```{}```", lines.join("\n"))
}

/// Pad to `width` characters, cutting anything longer.
fn fit(value: &str, width: usize) -> String {
    let cut: String = value.chars().take(width).collect();
    format!("{:<width$}", cut, width = width)
}

fn title_cell(title: &str) -> String {
    if title.chars().count() > TITLE_CUT {
        let cut: String = title.chars().take(TITLE_CUT).collect();
        format!("{} ...", cut)
    } else {
        format!("{:<width$}", title, width = TITLE_COLUMN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn book(title: &str) -> BookRecord {
        BookRecord {
            bookid: "id".to_string(),
            title: title.to_string(),
            authors: "Someone".to_string(),
            pages: 100,
            description: String::new(),
        }
    }

    fn completion(title: &str, y: i32, m: u32, d: u32) -> Completion {
        Completion {
            completed: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            book: book(title),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 3).unwrap()
    }

    #[test]
    fn book_message_strips_markup() {
        let mut record = book("Dune");
        record.authors = "Frank Herbert".to_string();
        record.pages = 412;
        record.description = "<b>Great</b> read".to_string();

        assert_eq!(
            book_message(&record),
            "*Dune*\nAuthor: _Frank Herbert_ (pages: 412)\nDescription:\n```Great read```"
        );
    }

    #[test]
    fn strip_markup_handles_attributes_and_nesting() {
        assert_eq!(
            strip_markup(r#"<p class="x">One <i>two</i></p><br/>three"#),
            "One twothree"
        );
        assert_eq!(strip_markup("a < b"), "a < b");
    }

    #[test]
    fn listing_sorts_by_latest_completion_descending() {
        let mut users = UserBooksMap::new();
        users.insert("a".to_string(), vec![completion("Old Book", 2023, 1, 1)]);
        users.insert("b".to_string(), vec![completion("New Book", 2023, 6, 1)]);

        let out = user_listing(&users, "https://home", today());
        let a = out.find("Old Book").unwrap();
        let b = out.find("New Book").unwrap();
        assert!(b < a);
    }

    #[test]
    fn listing_uses_each_users_latest_book() {
        let mut users = UserBooksMap::new();
        users.insert(
            "alice".to_string(),
            vec![
                completion("Second", 2023, 5, 1),
                completion("Third", 2023, 6, 2),
                completion("First", 2023, 1, 1),
            ],
        );

        let out = user_listing(&users, "https://home", today());
        assert!(out.contains("Third"));
        assert!(!out.contains("Second"));
        assert!(out.contains("(yesterday)"));
    }

    #[test]
    fn readers_without_books_sort_last() {
        let mut users = UserBooksMap::new();
        users.insert("aaron".to_string(), Vec::new());
        users.insert("zoe".to_string(), vec![completion("Dune", 2020, 1, 1)]);

        let out = user_listing(&users, "https://home", today());
        let lines: Vec<&str> = out.trim_matches('`').lines().collect();
        assert!(lines[2].starts_with("zoe "));
        assert_eq!(lines[3], format!("{:<20}: no books read yet", "aaron"));
    }

    #[test]
    fn listing_layout_is_fixed_width() {
        let mut users = UserBooksMap::new();
        users.insert(
            "a_rather_long_username_here".to_string(),
            vec![completion(
                "An Exceptionally Long Book Title That Goes On",
                2023,
                6,
                3,
            )],
        );
        users.insert("bo".to_string(), vec![completion("Dune", 2023, 5, 24)]);

        let out = user_listing(&users, "https://home", today());
        assert!(out.starts_with("```") && out.ends_with("```"));

        let lines: Vec<&str> = out.trim_matches('`').lines().collect();
        assert_eq!(lines[0], "User                : Last read -> https://home");
        assert_eq!(lines[1], "-".repeat(74));
        assert_eq!(
            lines[2],
            "a_rather_long_userna: An Exceptionally Long Book Title ... (today)"
        );
        assert_eq!(
            lines[3],
            format!("{:<20}: {:<36} (10 days ago)", "bo", "Dune")
        );
    }
}
