//! Built-in question pool used when the remote provider is unset, exhausted,
//! or keeps returning malformed batches.

use crate::provider::RawQuestion;

/// A small general-knowledge pool, `correct_option` already 1-based to match
/// the wire contract the remote provider uses.
pub const FALLBACK_QUESTIONS: &[(&str, [&str; 4], u8)] = &[
    ("Which of these is a programming language?", ["HTTP", "Python", "SQLite", "CSS"], 2),
    ("Which protocol is typically used for websockets?", ["ws/wss", "ftp", "smtp", "ssh"], 1),
    ("What does a database like SQLite do?", ["Renders a UI", "Stores data", "Compiles code", "Runs a browser"], 2),
    ("Which HTTP method is conventionally used to create a resource?", ["GET", "PUT", "POST", "DELETE"], 3),
    ("Which of these belongs to the frontend?", ["HTML", "SQL", "Linux kernel", "Docker image"], 1),
    ("Which of these describes a web framework?", ["A compiler", "A web framework", "A DBMS", "An operating system"], 2),
    ("Which format is most common for exchanging data in an API?", ["JPEG", "JSON", "MP3", "PDF"], 2),
    ("Which of these is a version control system?", ["Git", "Redis", "Nginx", "Kafka"], 1),
    ("What is the default port for HTTPS?", ["21", "80", "443", "8080"], 3),
    ("Which data structure is FIFO by nature?", ["Stack", "Queue", "Tree", "Heap"], 2),
    ("What does CSS stand for?", ["Cascading Style Sheets", "Computer Style System", "Creative Style Syntax", "Code Styling Standard"], 1),
    ("Which company maintains the Rust project?", ["Oracle", "The Rust Foundation", "Microsoft", "Apple"], 2),
    ("Which of these is a NoSQL database?", ["PostgreSQL", "MongoDB", "MySQL", "MariaDB"], 2),
    ("What does an HTTP 404 status mean?", ["Unauthorized", "Server error", "Not found", "Redirect"], 3),
    ("Which keyword declares an immutable binding in Rust?", ["var", "let", "const fn", "mut"], 2),
];

/// Draw up to `count` unused fallback questions, shuffled with `rng`.
pub fn draw(rng: &mut impl rand::Rng, used_texts: &[String], count: usize) -> Vec<RawQuestion> {
    let mut pool: Vec<&(&str, [&str; 4], u8)> =
        FALLBACK_QUESTIONS.iter().filter(|(text, _, _)| !used_texts.iter().any(|u| u == text)).collect();

    use rand::seq::SliceRandom;
    pool.shuffle(rng);

    pool.into_iter()
        .take(count)
        .map(|(text, options, correct_option)| RawQuestion {
            text: text.to_string(),
            options: options.map(|o| o.to_string()),
            correct_option: *correct_option,
        })
        .collect()
}
