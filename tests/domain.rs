use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use vod_batch::domain::{Quality, TaskBuilder, Validation};
use vod_batch::input::parse_list;

#[test]
fn quality_presets_map_to_format_selectors() {
    assert_eq!(Quality::Source.format_spec(), "best");
    assert_eq!(
        Quality::P1080.format_spec(),
        "bestvideo[height<=1080]+bestaudio/best"
    );
    assert_eq!(
        Quality::P480.format_spec(),
        "bestvideo[height<=480]+bestaudio/best"
    );
    assert_eq!(Quality::AudioOnly.format_spec(), "bestaudio");
}

#[test]
fn rejected_locators_never_become_tasks() {
    let mut builder = TaskBuilder::new(Quality::Source, Utf8PathBuf::from("/videos"));
    assert_matches!(builder.validate(""), Validation::Rejected { .. });
    assert_matches!(builder.validate("twitch.tv/videos/1"), Validation::Rejected { .. });
    assert_matches!(builder.validate("mailto:x@y"), Validation::Rejected { .. });

    let tasks = builder.build_all(parse_list(
        "https://www.twitch.tv/videos/1\nftp://x/y\n# comment\nhttps://www.twitch.tv/videos/2\n",
    ));
    let locators: Vec<_> = tasks.iter().map(|task| task.locator()).collect();
    assert_eq!(
        locators,
        vec![
            "https://www.twitch.tv/videos/1",
            "https://www.twitch.tv/videos/2"
        ]
    );
    assert!(tasks.iter().all(|task| task.destination_dir().as_str() == "/videos"));
}
