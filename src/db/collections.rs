use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::models::{
    Article, ContentItem, ContentKind, Prayer, PrayerRequest, QuizQuestion, Study,
};

use super::keys;
use super::kv::KeyValueStore;
use super::seed;

/// A record type persisted as one JSON array under `KEY`.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KEY: &'static str;

    fn id(&self) -> &str;

    /// Contents reported when the collection was never written or cannot be
    /// parsed.
    fn seed() -> Vec<Self> {
        Vec::new()
    }
}

impl Record for Study {
    const KEY: &'static str = keys::STUDIES;

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        seed::studies()
    }
}

impl Record for Article {
    const KEY: &'static str = keys::ARTICLES;

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        seed::articles()
    }
}

impl Record for Prayer {
    const KEY: &'static str = keys::PRAYERS;

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        seed::prayers()
    }
}

impl Record for QuizQuestion {
    const KEY: &'static str = keys::QUIZ;

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        seed::quiz()
    }
}

impl Record for PrayerRequest {
    const KEY: &'static str = keys::COMMUNITY_PRAYERS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Namespaced content store over an injectable key-value medium.
///
/// Every mutation is a read-modify-write of the whole collection: the current
/// array is re-read, changed, and written back in one `set`. Callers never
/// hold a cached copy between operations, so back-to-back mutations always
/// start from what is actually stored.
pub struct ContentStore<S> {
    kv: S,
}

impl<S: KeyValueStore> ContentStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Access the backing medium.
    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Every record of the collection in stored order. Missing or unreadable
    /// data yields the collection's seed list; this never fails. Only for
    /// display: mutations go through `load`.
    pub fn all<R: Record>(&self) -> Vec<R> {
        self.load().unwrap_or_else(|err| {
            warn!(key = R::KEY, error = %err, "collection read failed, using defaults");
            R::seed()
        })
    }

    /// Current collection for a read-modify-write. Absent or unparseable data
    /// still yields the seed list, but a backend read failure is returned so
    /// nothing gets written over records that could not be seen.
    pub(super) fn load<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let Some(raw) = self.kv.get(R::KEY)? else {
            return Ok(R::seed());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(key = R::KEY, error = %err, "unreadable collection, using defaults");
            R::seed()
        }))
    }

    pub fn find<R: Record>(&self, id: &str) -> Option<R> {
        self.all::<R>().into_iter().find(|record| record.id() == id)
    }

    /// Upsert by id: an existing record is replaced where it stands, a new one
    /// goes to the end.
    pub fn save<R: Record>(&self, record: R) -> Result<(), StoreError> {
        let mut records = self.load::<R>()?;
        match records.iter().position(|existing| existing.id() == record.id()) {
            Some(index) => records[index] = record,
            None => records.push(record),
        }
        self.persist(&records)
    }

    /// Remove the record with `id`. Nothing is written when it is absent.
    pub fn delete<R: Record>(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.load::<R>()?;
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Ok(());
        }
        self.persist(&records)
    }

    /// Write the whole collection back.
    pub(super) fn persist<R: Record>(&self, records: &[R]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(records)?;
        self.kv.set(R::KEY, &raw)?;
        info!(key = R::KEY, count = records.len(), "collection saved");
        Ok(())
    }

    /// List a curated collection as tagged items for the admin screen.
    pub fn list_items(&self, kind: ContentKind) -> Vec<ContentItem> {
        match kind {
            ContentKind::Study => self.all::<Study>().into_iter().map(ContentItem::Study).collect(),
            ContentKind::Article => self
                .all::<Article>()
                .into_iter()
                .map(ContentItem::Article)
                .collect(),
            ContentKind::Prayer => self
                .all::<Prayer>()
                .into_iter()
                .map(ContentItem::Prayer)
                .collect(),
            ContentKind::Quiz => self
                .all::<QuizQuestion>()
                .into_iter()
                .map(ContentItem::Quiz)
                .collect(),
        }
    }

    pub fn save_item(&self, item: ContentItem) -> Result<(), StoreError> {
        match item {
            ContentItem::Study(study) => self.save(study),
            ContentItem::Article(article) => self.save(article),
            ContentItem::Prayer(prayer) => self.save(prayer),
            ContentItem::Quiz(question) => self.save(question),
        }
    }

    pub fn delete_item(&self, kind: ContentKind, id: &str) -> Result<(), StoreError> {
        match kind {
            ContentKind::Study => self.delete::<Study>(id),
            ContentKind::Article => self.delete::<Article>(id),
            ContentKind::Prayer => self.delete::<Prayer>(id),
            ContentKind::Quiz => self.delete::<QuizQuestion>(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::PrayerKind;

    fn question(id: &str, text: &str) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            question: text.to_string(),
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_index: 0,
            explanation: None,
        }
    }

    fn article(id: &str, title: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            author: "Pastoral Team".to_string(),
            content: "Body".to_string(),
            date: "01/01/2024".to_string(),
            image: None,
            timestamp: 1,
        }
    }

    fn ids<R: Record>(records: &[R]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn save_upserts_in_place() {
        let store = ContentStore::new(MemoryStore::new().with_entry(keys::QUIZ, "[]"));
        store.save(question("a", "first")).unwrap();
        store.save(question("b", "second")).unwrap();
        store.save(question("c", "third")).unwrap();

        store.save(question("b", "second, edited")).unwrap();

        let all = store.all::<QuizQuestion>();
        assert_eq!(ids(&all), vec!["a", "b", "c"]);
        assert_eq!(all[1].question, "second, edited");
    }

    #[test]
    fn saving_twice_keeps_a_single_record() {
        let store = ContentStore::new(MemoryStore::new());
        store.save(article("x", "v1")).unwrap();
        store.save(article("x", "v2")).unwrap();

        let matching: Vec<Article> = store
            .all::<Article>()
            .into_iter()
            .filter(|a| a.id == "x")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].title, "v2");
    }

    #[test]
    fn save_on_empty_backend_appends_after_seed() {
        let store = ContentStore::new(MemoryStore::new());
        store.save(question("new", "added")).unwrap();
        let all = store.all::<QuizQuestion>();
        assert_eq!(ids(&all), vec!["q1", "new"]);
    }

    #[test]
    fn delete_removes_record() {
        let store = ContentStore::new(MemoryStore::new().with_entry(keys::QUIZ, "[]"));
        store.save(question("a", "first")).unwrap();
        store.save(question("b", "second")).unwrap();

        store.delete::<QuizQuestion>("a").unwrap();

        let all = store.all::<QuizQuestion>();
        assert_eq!(ids(&all), vec!["b"]);
        assert!(store.find::<QuizQuestion>("a").is_none());
    }

    #[test]
    fn delete_unknown_id_leaves_collection_unchanged() {
        let store = ContentStore::new(MemoryStore::new().with_entry(keys::QUIZ, "[]"));
        store.save(question("a", "first")).unwrap();
        store.save(question("b", "second")).unwrap();
        let before = store.all::<QuizQuestion>();
        let raw_before = store.backend().raw(keys::QUIZ);

        store.delete::<QuizQuestion>("missing").unwrap();

        assert_eq!(store.all::<QuizQuestion>(), before);
        assert_eq!(store.backend().raw(keys::QUIZ), raw_before);
    }

    #[test]
    fn empty_backend_returns_seeds() {
        let store = ContentStore::new(MemoryStore::new());
        assert!(!store.all::<Study>().is_empty());
        assert!(!store.all::<Prayer>().is_empty());
        assert!(!store.all::<QuizQuestion>().is_empty());
        assert!(!store.all::<Article>().is_empty());
        assert!(store.all::<PrayerRequest>().is_empty());
    }

    #[test]
    fn corrupt_collection_falls_back_to_seed() {
        let store = ContentStore::new(
            MemoryStore::new()
                .with_entry(keys::QUIZ, "{not json")
                .with_entry(keys::COMMUNITY_PRAYERS, "[{\"broken\":"),
        );
        let quiz = store.all::<QuizQuestion>();
        assert_eq!(ids(&quiz), vec!["q1"]);
        assert!(store.all::<PrayerRequest>().is_empty());
    }

    #[test]
    fn seed_reads_are_idempotent() {
        let store = ContentStore::new(MemoryStore::new());
        assert_eq!(store.all::<Study>(), store.all::<Study>());
        assert_eq!(store.all::<Prayer>(), store.all::<Prayer>());
        assert_eq!(store.all::<QuizQuestion>(), store.all::<QuizQuestion>());
        assert!(store.backend().raw(keys::STUDIES).is_none());
    }

    #[test]
    fn explicitly_emptied_collection_stays_empty() {
        let store = ContentStore::new(MemoryStore::new());
        store.delete::<QuizQuestion>("q1").unwrap();
        assert!(store.all::<QuizQuestion>().is_empty());
    }

    #[test]
    fn write_failure_is_reported_and_nothing_changes() {
        let store = ContentStore::new(MemoryStore::new().with_entry(keys::QUIZ, "[]"));
        store.backend().set_fail_writes(true);

        let err = store.save(question("a", "first")).unwrap_err();

        assert!(matches!(err, StoreError::StorageWrite { .. }));
        assert!(store.all::<QuizQuestion>().is_empty());

        store.backend().set_fail_writes(false);
        store.save(question("a", "first")).unwrap();
        assert_eq!(store.all::<QuizQuestion>().len(), 1);
    }

    #[test]
    fn read_failure_aborts_save_without_writing() {
        let store = ContentStore::new(MemoryStore::new().with_entry(keys::QUIZ, "[]"));
        store.save(question("a", "first")).unwrap();
        store.save(question("b", "second")).unwrap();
        let raw_before = store.backend().raw(keys::QUIZ);

        store.backend().set_fail_reads(true);
        let err = store.save(question("c", "third")).unwrap_err();
        assert!(matches!(err, StoreError::StorageRead { .. }));
        store.delete::<QuizQuestion>("a").unwrap_err();

        assert_eq!(store.backend().raw(keys::QUIZ), raw_before);
        store.backend().set_fail_reads(false);
        assert_eq!(ids(&store.all::<QuizQuestion>()), vec!["a", "b"]);
    }

    #[test]
    fn display_read_failure_shows_seed() {
        let store = ContentStore::new(MemoryStore::new().with_entry(keys::QUIZ, "[]"));
        store.backend().set_fail_reads(true);
        assert_eq!(ids(&store.all::<QuizQuestion>()), vec!["q1"]);
    }

    #[test]
    fn tagged_items_route_to_their_collection() {
        let store = ContentStore::new(MemoryStore::new().with_entry(keys::PRAYERS, "[]"));
        let prayer = Prayer {
            id: "p9".into(),
            kind: PrayerKind::Custom,
            title: "About: anxiety".into(),
            content: "Lord, ... Amen.".into(),
            date: "01/01/2024".into(),
        };
        store.save_item(ContentItem::Prayer(prayer)).unwrap();

        let items = store.list_items(ContentKind::Prayer);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), "p9");

        store.delete_item(ContentKind::Prayer, "p9").unwrap();
        assert!(store.list_items(ContentKind::Prayer).is_empty());
    }
}
