//! Prayer board mutations. Requests are kept newest-first, unlike the other
//! collections. Each operation re-reads the stored board before changing it.

use tracing::debug;

use crate::error::StoreError;
use crate::models::{Comment, PrayerRequest};

use super::collections::ContentStore;
use super::kv::KeyValueStore;

impl<S: KeyValueStore> ContentStore<S> {
    /// Board contents, newest first.
    pub fn requests(&self) -> Vec<PrayerRequest> {
        self.all::<PrayerRequest>()
    }

    /// Put a new request at the top of the board. A request whose id is
    /// already on the board is replaced where it stands.
    pub fn post_request(&self, request: PrayerRequest) -> Result<(), StoreError> {
        let mut requests = self.load::<PrayerRequest>()?;
        match requests.iter().position(|existing| existing.id == request.id) {
            Some(index) => requests[index] = request,
            None => requests.insert(0, request),
        }
        self.persist(&requests)
    }

    /// Add one amen. Returns `false` without writing when the id is unknown.
    pub fn add_amen(&self, id: &str) -> Result<bool, StoreError> {
        let mut requests = self.load::<PrayerRequest>()?;
        let Some(request) = requests.iter_mut().find(|request| request.id == id) else {
            debug!(id, "amen for unknown request ignored");
            return Ok(false);
        };
        request.amens = request.amens.saturating_add(1);
        self.persist(&requests)?;
        Ok(true)
    }

    /// Append a comment to a request's thread. Returns `false` without
    /// writing when the request is unknown.
    pub fn add_comment(&self, request_id: &str, comment: Comment) -> Result<bool, StoreError> {
        let mut requests = self.load::<PrayerRequest>()?;
        let Some(request) = requests.iter_mut().find(|request| request.id == request_id) else {
            debug!(request_id, "comment for unknown request ignored");
            return Ok(false);
        };
        request.comments.push(comment);
        self.persist(&requests)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::db::{keys, ContentStore, MemoryStore};
    use crate::error::StoreError;
    use crate::models::{Comment, PrayerRequest};

    fn request(id: &str) -> PrayerRequest {
        PrayerRequest {
            id: id.to_string(),
            author: "Maria".to_string(),
            content: format!("request {id}"),
            timestamp: 0,
            amens: 0,
            comments: Vec::new(),
        }
    }

    fn comment(id: &str) -> Comment {
        Comment {
            id: id.to_string(),
            author: "João".to_string(),
            content: format!("praying ({id})"),
            timestamp: 0,
        }
    }

    #[test]
    fn new_requests_go_first() {
        let store = ContentStore::new(MemoryStore::new());
        store.post_request(request("r1")).unwrap();
        store.post_request(request("r2")).unwrap();
        store.post_request(request("r3")).unwrap();

        let ids: Vec<String> = store.requests().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r3", "r2", "r1"]);
    }

    #[test]
    fn reposting_replaces_in_place() {
        let store = ContentStore::new(MemoryStore::new());
        store.post_request(request("r1")).unwrap();
        store.post_request(request("r2")).unwrap();

        let mut edited = request("r1");
        edited.content = "edited".to_string();
        store.post_request(edited).unwrap();

        let requests = store.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].id, "r1");
        assert_eq!(requests[1].content, "edited");
    }

    #[test]
    fn sequential_amens_accumulate() {
        let store = ContentStore::new(MemoryStore::new());
        store.post_request(request("r1")).unwrap();
        store.post_request(request("r2")).unwrap();

        for _ in 0..5 {
            assert!(store.add_amen("r1").unwrap());
        }

        let requests = store.requests();
        assert_eq!(requests[1].amens, 5);
        assert_eq!(requests[0].amens, 0);
    }

    #[test]
    fn amen_for_unknown_id_changes_nothing() {
        let store = ContentStore::new(MemoryStore::new());
        store.post_request(request("r1")).unwrap();
        store.add_amen("r1").unwrap();
        let raw_before = store.backend().raw(keys::COMMUNITY_PRAYERS);

        assert!(!store.add_amen("ghost").unwrap());

        assert_eq!(store.backend().raw(keys::COMMUNITY_PRAYERS), raw_before);
        assert_eq!(store.requests()[0].amens, 1);
    }

    #[test]
    fn first_comment_initialises_thread() {
        let store = ContentStore::new(
            MemoryStore::new().with_entry(
                keys::COMMUNITY_PRAYERS,
                r#"[{"id":"r1","userName":"Ana","content":"help","timestamp":5,"amens":2}]"#,
            ),
        );

        assert!(store.add_comment("r1", comment("c1")).unwrap());

        let requests = store.requests();
        assert_eq!(requests[0].comments, vec![comment("c1")]);
        assert_eq!(requests[0].amens, 2);
    }

    #[test]
    fn comments_keep_insertion_order() {
        let store = ContentStore::new(MemoryStore::new());
        store.post_request(request("r1")).unwrap();
        for id in ["c1", "c2", "c3"] {
            store.add_comment("r1", comment(id)).unwrap();
        }

        let ids: Vec<String> = store.requests()[0]
            .comments
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn unreadable_board_is_never_overwritten() {
        let store = ContentStore::new(MemoryStore::new());
        for id in ["r0", "r1", "r2"] {
            store.post_request(request(id)).unwrap();
        }
        let raw_before = store.backend().raw(keys::COMMUNITY_PRAYERS);

        store.backend().set_fail_reads(true);
        let err = store.post_request(request("r9")).unwrap_err();
        assert!(matches!(err, StoreError::StorageRead { .. }));
        assert!(store.add_amen("r0").is_err());
        assert!(store.add_comment("r0", comment("c1")).is_err());
        store.backend().set_fail_reads(false);

        assert_eq!(store.backend().raw(keys::COMMUNITY_PRAYERS), raw_before);
        let ids: Vec<String> = store.requests().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r2", "r1", "r0"]);
    }

    #[test]
    fn comment_for_unknown_request_is_ignored() {
        let store = ContentStore::new(MemoryStore::new());
        store.post_request(request("r1")).unwrap();
        assert!(!store.add_comment("nope", comment("c1")).unwrap());
        assert!(store.requests()[0].comments.is_empty());
    }
}
