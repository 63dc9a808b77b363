//! Built-in content reported for collections that were never written.

use crate::models::{Article, Prayer, PrayerKind, QuizQuestion, Study};

/// 2024-05-13T00:00:00Z, the first seeded study.
const SEED_EPOCH_MS: i64 = 1_715_558_400_000;
const DAY_MS: i64 = 86_400_000;

struct SeedStudy {
    title: &'static str,
    verse: &'static str,
    explanation: &'static str,
    application: &'static str,
    prayer: &'static str,
}

const STUDIES: &[SeedStudy] = &[
    SeedStudy {
        title: "A Lamp for the Path",
        verse: "Your word is a lamp to my feet and a light to my path. (Psalm 119:105)",
        explanation: "A lamp does not light up the whole road, only the next step. God's word guides us one faithful step at a time.",
        application: "Read one passage before checking your phone this morning.",
        prayer: "Lord, light my next step today. Amen.",
    },
    SeedStudy {
        title: "Perseverance in Trials",
        verse: "The testing of your faith produces perseverance. (James 1:3)",
        explanation: "Trials are not wasted. They shape a steady faith that keeps going when feelings fade.",
        application: "Name one difficulty you are facing and thank God for what it is teaching you.",
        prayer: "Father, make me steadfast while I wait on you. Amen.",
    },
    SeedStudy {
        title: "Peace Beyond Understanding",
        verse: "Do not be anxious about anything, but in every situation, by prayer and petition, with thanksgiving, present your requests to God. (Philippians 4:6)",
        explanation: "Anxiety is answered with prayer and thanksgiving, not with more control.",
        application: "Turn each worry that comes up today into a one-sentence prayer.",
        prayer: "Lord, I give you what I cannot carry. Guard my heart. Amen.",
    },
    SeedStudy {
        title: "The Good Shepherd",
        verse: "The Lord is my shepherd, I lack nothing. (Psalm 23:1)",
        explanation: "A shepherd leads, provides and protects. Our needs are known before we speak them.",
        application: "Write down three ways God has provided for you this week.",
        prayer: "Shepherd of my soul, lead me beside quiet waters. Amen.",
    },
    SeedStudy {
        title: "Love in Action",
        verse: "Let us not love with words or speech but with actions and in truth. (1 John 3:18)",
        explanation: "Love proves itself in what we do for others, especially when it costs us something.",
        application: "Do one unseen act of kindness for someone close to you.",
        prayer: "Jesus, let my love be real and practical today. Amen.",
    },
    SeedStudy {
        title: "Strength Renewed",
        verse: "Those who hope in the Lord will renew their strength. (Isaiah 40:31)",
        explanation: "Waiting on God is not passive. It is trusting him to supply the strength we lack.",
        application: "Take five quiet minutes to rest in God before your busiest task.",
        prayer: "Lord, renew my strength as I hope in you. Amen.",
    },
    SeedStudy {
        title: "A New Creation",
        verse: "If anyone is in Christ, the new creation has come. (2 Corinthians 5:17)",
        explanation: "Our past does not define us. In Christ we are made new and given a new purpose.",
        application: "Let go of one old regret by confessing it and receiving forgiveness.",
        prayer: "Father, thank you for making all things new in me. Amen.",
    },
];

pub(super) fn studies() -> Vec<Study> {
    STUDIES
        .iter()
        .enumerate()
        .map(|(index, seed)| {
            let timestamp = SEED_EPOCH_MS + index as i64 * DAY_MS;
            Study {
                id: format!("s{}", index + 1),
                title: seed.title.to_string(),
                verse: seed.verse.to_string(),
                explanation: seed.explanation.to_string(),
                application: seed.application.to_string(),
                prayer: seed.prayer.to_string(),
                date: format!("{:02}/05/2024", 13 + index),
                image: None,
                timestamp,
            }
        })
        .collect()
}

pub(super) fn articles() -> Vec<Article> {
    vec![Article {
        id: "a1".to_string(),
        title: "The Importance of Perseverance".to_string(),
        author: "Pastoral Team".to_string(),
        content: "Perseverance is one of the most celebrated virtues in Scripture. In James 1 we are reminded that the testing of our faith produces patience. Persevering is not only waiting, but keeping the right attitude while we wait for God's promises to be fulfilled.".to_string(),
        date: "15/05/2024".to_string(),
        image: None,
        timestamp: SEED_EPOCH_MS + 2 * DAY_MS,
    }]
}

pub(super) fn prayers() -> Vec<Prayer> {
    let date = "13/05/2024".to_string();
    vec![
        Prayer {
            id: "p1".to_string(),
            kind: PrayerKind::Morning,
            title: "Morning Prayer".to_string(),
            content: "Lord, thank you for this new day. I place my plans in your hands.".to_string(),
            date: date.clone(),
        },
        Prayer {
            id: "p2".to_string(),
            kind: PrayerKind::Night,
            title: "Night Prayer".to_string(),
            content: "Father, thank you for your protection today. May my sleep be restful in you.".to_string(),
            date,
        },
    ]
}

pub(super) fn quiz() -> Vec<QuizQuestion> {
    vec![QuizQuestion {
        id: "q1".to_string(),
        question: "Who succeeded Moses in leading the people into Canaan?".to_string(),
        options: vec![
            "Aaron".to_string(),
            "Joshua".to_string(),
            "Caleb".to_string(),
            "Gideon".to_string(),
        ],
        correct_index: 1,
        explanation: None,
    }]
}
