/// Bot integration tests: catalogs on disk through dispatch to replies.

use rap_battle_bot::core::pipeline::{Bot, BotConfig, CommandName};
use rap_battle_bot::schema::command::{CommandSchema, Invocation};
use rap_battle_bot::schema::reply::Reply;
use rap_battle_bot::schema::track::Track;
use std::path::PathBuf;

fn fixture_config() -> BotConfig {
    BotConfig {
        data_dir: PathBuf::from("tests/fixtures"),
        tracks: Some(PathBuf::from("tests/fixtures/test_beats.ron")),
        characters: Some(PathBuf::from("tests/fixtures/test_characters.json")),
        roster: Some(PathBuf::from("tests/fixtures/test_roster.ron")),
        series: Some(PathBuf::from("tests/fixtures/test_series.ron")),
        seed: Some(42),
        ..BotConfig::default()
    }
}

fn numbered_tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track {
            name: format!("Loop {}", i),
            producers: Some(vec!["Aqua".to_string()]),
            genres: Some(vec!["Trap".to_string()]),
            moods: None,
            bpm: Some(80.0 + i as f64),
            file_url: format!("https://beats.example.com/files/loop_{}.mp3", i),
            page_url: format!("https://beats.example.com/beats/loop_{}", i),
            available_for_purchase: None,
        })
        .collect()
}

fn titles(reply: &Reply) -> Vec<String> {
    reply.cards().iter().map(|c| c.title.clone()).collect()
}

#[test]
fn fixture_bot_loads_every_command() {
    let bot = Bot::builder().config(fixture_config()).build();
    assert_eq!(bot.available_commands(), CommandName::ALL.to_vec());
    assert_eq!(bot.track_count(), 4);
}

#[test]
fn shipped_data_dir_loads_every_command() {
    let bot = Bot::builder().data_dir("data").seed(1).build();
    assert_eq!(bot.available_commands(), CommandName::ALL.to_vec());
    assert!(bot.track_count() > 0);
}

#[test]
fn beat_exact_name_and_tags() {
    let bot = Bot::builder().config(fixture_config()).build();

    let reply = bot
        .dispatch(&Invocation::new("beat").with_string("exact-name", "night drive"))
        .unwrap();
    assert_eq!(titles(&reply), ["**Night Drive** by **Aqua**"]);

    let reply = bot
        .dispatch(
            &Invocation::new("beat")
                .with_string("genres", "boom bap")
                .with_boolean("every", true),
        )
        .unwrap();
    let mut found = titles(&reply);
    found.sort();
    assert_eq!(
        found,
        [
            "**Cold Open** by **Nine Volt**",
            "**Dusty Crates** by **Loop Theory, Aqua**"
        ]
    );
}

#[test]
fn beat_purchasable_drops_sold_beats() {
    let bot = Bot::builder().config(fixture_config()).build();
    let reply = bot
        .dispatch(
            &Invocation::new("beat")
                .with_string("producers", "nine volt")
                .with_boolean("purchasable", true),
        )
        .unwrap();
    assert_eq!(reply, Reply::text("No matching beats found."));

    let reply = bot
        .dispatch(&Invocation::new("beat").with_string("producers", "nine volt"))
        .unwrap();
    let card = &reply.cards()[0];
    assert!(card.footer.is_some());
    assert_eq!(card.field_value("BPM"), Some("92.5"));
}

#[test]
fn beat_bpm_range_and_fuzzy_name() {
    let bot = Bot::builder().config(fixture_config()).build();

    let reply = bot
        .dispatch(
            &Invocation::new("beat")
                .with_string("bpm", "85-95")
                .with_boolean("every", true),
        )
        .unwrap();
    assert_eq!(reply.cards().len(), 2);

    let reply = bot
        .dispatch(&Invocation::new("beat").with_string("name", "dusty crate"))
        .unwrap();
    assert_eq!(titles(&reply)[0], "**Dusty Crates** by **Loop Theory, Aqua**");
}

#[test]
fn beat_too_many_requested() {
    let bot = Bot::builder()
        .seed(9)
        .with_tracks(numbered_tracks(20))
        .build();

    let reply = bot
        .dispatch(&Invocation::new("beat").with_integer("num", 15))
        .unwrap();
    assert_eq!(
        reply,
        Reply::text("15 beats found, but I can only display 10 at once.")
    );

    let reply = bot
        .dispatch(&Invocation::new("beat").with_integer("num", 10))
        .unwrap();
    let mut found = titles(&reply);
    assert_eq!(found.len(), 10);
    found.sort();
    found.dedup();
    assert_eq!(found.len(), 10);
}

#[test]
fn beat_every_respects_cap() {
    let bot = Bot::builder()
        .seed(9)
        .max_beats(5)
        .with_tracks(numbered_tracks(8))
        .build();
    let reply = bot
        .dispatch(&Invocation::new("beat").with_boolean("every", true))
        .unwrap();
    assert_eq!(
        reply,
        Reply::text("8 beats found, but I can only display 5 at once.")
    );
}

#[test]
fn matchup_uses_roster_and_series_override() {
    let bot = Bot::builder().config(fixture_config()).build();
    let roster = ["Ace", "Blaze", "Cipher", "Dice"];

    for _ in 0..30 {
        let reply = bot.dispatch(&Invocation::new("matchup")).unwrap();
        let card = &reply.cards()[0];
        assert!(card.title.contains(" vs "));
        assert!(card.description.as_deref().unwrap().starts_with("Fixture "));
        assert!((2..=4).contains(&card.fields.len()));
        for field in &card.fields {
            assert!(roster.contains(&field.name.as_str()));
            assert!(field.value.starts_with("as ["));
        }
    }
}

#[test]
fn structure_scenarios() {
    let bot = Bot::builder().config(fixture_config()).build();

    let reply = bot
        .dispatch(
            &Invocation::new("structure")
                .with_integer("length", 10)
                .with_integer("verses", 4),
        )
        .unwrap();
    let bars: Vec<u32> = reply
        .as_text()
        .unwrap()
        .split('-')
        .map(|n| n.parse().unwrap())
        .collect();
    assert_eq!(bars.len(), 4);
    assert_eq!(bars.iter().sum::<u32>(), 20);
    assert!(bars.iter().all(|b| b % 2 == 0 && *b >= 2));

    let reply = bot
        .dispatch(&Invocation::new("structure").with_integer("length", 1))
        .unwrap();
    assert_eq!(reply, Reply::text("Battles need at least 4 bars!"));

    let reply = bot
        .dispatch(&Invocation::new("structure").with_integer("verses", 1))
        .unwrap();
    assert_eq!(reply, Reply::text("Battles need at least 2 verses!"));
}

#[test]
fn typed_lines_dispatch_like_client_invocations() {
    let bot = Bot::builder().config(fixture_config()).build();
    let schemas: Vec<CommandSchema> = bot.schemas();

    let invocation =
        Invocation::parse_line("/beat \"exact-name:Dusty Crates\"", &schemas).unwrap();
    let reply = bot.dispatch(&invocation).unwrap();
    assert_eq!(titles(&reply), ["**Dusty Crates** by **Loop Theory, Aqua**"]);
}

#[test]
fn schemas_cover_only_loaded_commands() {
    let bot = Bot::builder()
        .data_dir("tests/fixtures/does_not_exist")
        .build();
    let names: Vec<String> = bot.schemas().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["structure"]);
    assert!(bot.dispatch(&Invocation::new("matchup")).is_none());
}

#[test]
fn broken_series_override_disables_matchup() {
    let config = BotConfig {
        series: Some(PathBuf::from("tests/fixtures/broken_series.ron")),
        ..fixture_config()
    };
    let bot = Bot::builder().config(config).build();
    assert!(!bot.is_available(CommandName::Matchup));
    assert!(bot.dispatch(&Invocation::new("matchup")).is_none());
    assert!(bot.is_available(CommandName::Beat));
}
