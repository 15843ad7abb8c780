//! The `kanjiflow init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("kanjiflow.toml").exists() {
        println!("kanjiflow.toml already exists, skipping.");
    } else {
        std::fs::write("kanjiflow.toml", SAMPLE_CONFIG)?;
        println!("Created kanjiflow.toml");
    }

    std::fs::create_dir_all("decks")?;
    let example_path = std::path::Path::new("decks/example.toml");
    if example_path.exists() {
        println!("decks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DECK)?;
        println!("Created decks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: kanjiflow validate decks/example.toml");
    println!("  2. Run: kanjiflow import decks/example.toml");
    println!("  3. Run: kanjiflow next \"Example Kanji\"");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# kanjiflow configuration

[store]
type = "json"
path = "kanjiflow.json"

# Policy for every deck; `kanjiflow deck set` overrides fields per deck.
[defaults]
new_card_daily_limit = 5
review_daily_limit = 20
learning_steps = [10, 1440]
graduating_interval = 4
"#;

const EXAMPLE_DECK: &str = r#"[deck]
name = "Example Kanji"
description = "A few elementary kanji to get started"

[[cards]]
front = "日"
back = "sun, day"
onyomi = "ニチ, ジツ"
kunyomi = "ひ, か"

[[cards]]
front = "月"
back = "moon, month"
onyomi = "ゲツ, ガツ"
kunyomi = "つき"

[[cards]]
front = "火"
back = "fire"
onyomi = "カ"
kunyomi = "ひ"

[[cards]]
front = "水"
back = "water"
onyomi = "スイ"
kunyomi = "みず"

[[cards]]
front = "木"
back = "tree, wood"
onyomi = "モク, ボク"
kunyomi = "き"
"#;
