#[path = "support/painter.rs"]
mod painter;

use image::RgbaImage;
use nuzlocke_core::{
    Action, Charsets, FontMap, GlyphError, GlyphStore, LedgerOutcome, MatchMode, Member,
    Sprite, TextContext, TrackerConfig, TrackerSession, TrackerState,
    ValidityTables, ViewType, UserEvent, constants::ROW_HEIGHT, event_channel, parse_text,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use painter::FramePainter;

/// A random bitmap font covering every context vocabulary.
fn synthetic_store(seed: u64) -> GlyphStore {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let characters = Charsets::all_characters();
    let pairs: Vec<(char, String)> = characters
        .iter()
        .map(|&c| (c, format!("glyph_{:04x}", c as u32)))
        .collect();
    let mut store = GlyphStore::new(FontMap::from_pairs(pairs.clone()).unwrap());
    for (_, filename) in pairs {
        let width = rng.gen_range(4..=7);
        let mut indices = vec![0u8; (width * ROW_HEIGHT) as usize];
        for y in 1..ROW_HEIGHT - 1 {
            for x in 0..width - 1 {
                indices[(y * width + x) as usize] = rng.gen_range(0..=2);
            }
        }
        store.insert_sprite(filename, Sprite::from_indices(width, ROW_HEIGHT, indices).unwrap());
    }
    store
}

fn tables() -> ValidityTables {
    ValidityTables::new(
        ["Twinleaf Town", "Route 201", "Lake Verity"],
        ["Starly", "Bidoof", "Shinx", "Piplup", "Turtwig"],
    )
}

#[test]
fn every_context_reads_its_own_vocabulary() {
    let charsets = Charsets::build(&synthetic_store(41)).unwrap();
    for context in TextContext::ALL {
        let set = charsets.get(context);
        let text: String = set.characters().collect();
        for chunk in text.chars().collect::<Vec<_>>().chunks(12) {
            let word: String = chunk.iter().collect();
            let line = set.render(&word).unwrap();
            assert_eq!(parse_text(&line, set, MatchMode::Plain), vec![word.clone()], "{context}");
            assert_eq!(parse_text(&line, set, MatchMode::Masked), vec![word], "{context}");
        }
    }
}

#[test]
fn missing_sprite_data_is_distinguished_from_missing_mapping() {
    let full = synthetic_store(3);
    let mut pairs: Vec<(char, String)> = Charsets::all_characters()
        .into_iter()
        .map(|c| (c, format!("glyph_{:04x}", c as u32)))
        .collect();

    pairs.retain(|(c, _)| *c != 'Q');
    let unmapped = GlyphStore::new(FontMap::from_pairs(pairs.clone()).unwrap());
    assert!(matches!(
        unmapped.sprite('Q'),
        Err(GlyphError::NoTemplateMapped { character: 'Q' })
    ));

    pairs.push(('Q', "glyph_missing".to_string()));
    let mut store = GlyphStore::new(FontMap::from_pairs(pairs).unwrap());
    for c in Charsets::all_characters() {
        if c != 'Q' {
            let filename = format!("glyph_{:04x}", c as u32);
            store.insert_sprite(filename, full.sprite(c).unwrap().clone());
        }
    }
    assert!(matches!(
        Charsets::build(&store),
        Err(GlyphError::TemplateDataMissing { character: 'Q', .. })
    ));
}

#[test]
fn recognized_frames_drive_a_full_encounter() {
    let charsets = Charsets::build(&synthetic_store(17)).unwrap();
    let mut session = TrackerSession::new(
        TrackerState::default(),
        charsets.clone(),
        tables(),
        TrackerConfig::default(),
    );
    let (sender, queue) = event_channel();

    let arrive = FramePainter::new(&charsets).location("Route 201").finish();
    let report = session.tick(&arrive, &queue);
    assert_eq!(report.location, "Route 201");

    let appear = FramePainter::new(&charsets)
        .dialog(&["A wild Shinx appeared"])
        .finish();
    let report = session.tick(&appear, &queue);
    assert_eq!(report.view, ViewType::WildSingle);

    let battle = FramePainter::new(&charsets)
        .dialog(&["What will", "Piplup do"])
        .foe("Shinx")
        .ally("Piplup")
        .finish();
    session.tick(&battle, &queue);
    session.tick(&battle, &queue);
    assert_eq!(session.state().frequency("Route 201", "Shinx"), 1);
    assert_eq!(session.state().our_species[0], "Piplup");

    sender.send(UserEvent::FailEnc);
    let report = session.tick(&battle, &queue);
    assert_eq!(
        report.command,
        Some((
            UserEvent::FailEnc,
            LedgerOutcome::Committed(Action::FailCanonEnc {
                member: Member::new("Route 201", "Shinx")
            })
        ))
    );

    let fled = FramePainter::new(&charsets)
        .dialog(&["The wild Shinx fled"])
        .finish();
    let report = session.tick(&fled, &queue);
    assert_eq!(report.view, ViewType::Overworld);
    assert_eq!(session.state().canon("Route 201"), Some("Shinx"));
    assert_eq!(session.state().frequency("Route 201", "Shinx"), 1);

    sender.send(UserEvent::UndoAction);
    sender.send(UserEvent::RedoAction);
    session.tick(&fled, &queue);
    assert_eq!(session.state().canon("Route 201"), None);
    session.tick(&fled, &queue);
    assert_eq!(session.state().canon("Route 201"), Some("Shinx"));
}

#[test]
fn double_battle_capture_sent_to_box() {
    let charsets = Charsets::build(&synthetic_store(29)).unwrap();
    let state = TrackerState {
        location: "Lake Verity".to_string(),
        ..TrackerState::default()
    };
    let mut session = TrackerSession::new(state, charsets.clone(), tables(), TrackerConfig::default());
    let (_sender, queue) = event_channel();

    let frames = [
        FramePainter::new(&charsets)
            .dialog(&["A wild Starly and", "Bidoof appeared"])
            .finish(),
        FramePainter::new(&charsets).foes("Starly", "Bidoof").finish(),
        FramePainter::new(&charsets)
            .dialog(&["The wild Bidoof fainted"])
            .foes("Starly", "")
            .finish(),
        FramePainter::new(&charsets)
            .dialog(&["Gotcha Starly", "was caught"])
            .finish(),
    ];
    for frame in &frames {
        session.tick(frame, &queue);
    }
    assert_eq!(session.state().view_type, ViewType::Nickname);
    assert_eq!(session.state().frequency("Lake Verity", "Starly"), 1);
    assert_eq!(session.state().frequency("Lake Verity", "Bidoof"), 1);

    let transfer = FramePainter::new(&charsets)
        .dialog(&["Chewy was transferred to", "BOX 2 in someone’s PC"])
        .finish();
    let report = session.tick(&transfer, &queue);
    assert_eq!(report.view, ViewType::Overworld);
    assert_eq!(report.automatic.len(), 1);

    let member = Member::new("Lake Verity", "Starly").with_nickname(Some("Chewy".to_string()));
    assert!(session.state().boxed.contains(&member));
    assert_eq!(session.state().canon("Lake Verity"), Some("Starly"));
}

#[test]
fn raw_captures_are_downscaled_before_reading() {
    let charsets = Charsets::build(&synthetic_store(8)).unwrap();
    let config = TrackerConfig {
        scale: 2,
        ..TrackerConfig::default()
    };
    let mut session = TrackerSession::new(TrackerState::default(), charsets.clone(), tables(), config);
    let (_sender, queue) = event_channel();

    let native = FramePainter::new(&charsets).location("Twinleaf Town").finish();
    let capture = RgbaImage::from_fn(native.width() * 2, native.height() * 2, |x, y| {
        let [r, g, b] = native.get_pixel(x / 2, y / 2).0;
        image::Rgba([r, g, b, 255])
    });
    let report = session.tick_capture(&capture, &queue);
    assert_eq!(report.location, "Twinleaf Town");
}
