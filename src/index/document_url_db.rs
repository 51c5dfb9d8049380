use std::collections::BTreeMap;
use heed::{RoTxn, RwTxn};
use roaring::RoaringTreemap;
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::compression::posting_codec::{sorted_id_insert, sorted_id_remove, PostingCodec};
use crate::core::error::{Error, Result};
use crate::core::id_utils::PathIdResolver;
use crate::core::stats::SubDatabaseSize;
use crate::core::types::DocId;
use crate::index::logical_size;
use crate::storage::env::IdDbi;

/// Chains longer than this are treated as corrupt (cycles included).
pub const MAX_PATH_DEPTH: usize = 512;

/// Value of the id-filename database: where a path component hangs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePath {
    pub parent_id: DocId,
    pub name: Vec<u8>,
}

/// Entries a `put` still has to write: the leaf plus the ancestors
/// missing between it and `anchor`, nearest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPath<'u> {
    pub doc_id: DocId,
    pub parent_id: DocId,
    pub name: &'u [u8],
    anchor: DocId,
    missing: Vec<(DocId, &'u [u8])>,
}

/// Path hierarchy stored as two correlated maps:
/// id -> (parent, leaf name) and parent -> sorted child ids.
///
/// Root level entries have parent 0. Every write that touches one map
/// updates the other in the same transaction.
#[derive(Debug, Clone, Copy)]
pub struct DocumentUrlDb {
    id_tree: IdDbi,
    id_filename: IdDbi,
}

impl DocumentUrlDb {
    pub fn new(id_tree: IdDbi, id_filename: IdDbi) -> Self {
        DocumentUrlDb { id_tree, id_filename }
    }

    /// Records `url` for `doc_id`, inserting any missing ancestors.
    ///
    /// Ancestor ids come from `resolver`. Insertion stops at the first
    /// ancestor already present. Returns `Ok(false)` when an ancestor id
    /// cannot be resolved, in which case nothing is written.
    pub fn put(&self, wtxn: &mut RwTxn, doc_id: DocId, url: &[u8], resolver: &dyn PathIdResolver) -> Result<bool> {
        match self.resolve(wtxn, doc_id, url, resolver)? {
            Some(pending) => {
                self.insert(wtxn, &pending)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Works out which entries `put` would write, without writing them.
    ///
    /// `None` when the parent or one of the missing ancestors cannot be
    /// resolved.
    pub fn resolve<'u>(
        &self,
        rtxn: &RoTxn,
        doc_id: DocId,
        url: &'u [u8],
        resolver: &dyn PathIdResolver,
    ) -> Result<Option<PendingPath<'u>>> {
        validate_url(doc_id, url)?;

        let (parent_path, name) = split_parent(url);
        if parent_path.is_empty() {
            return Ok(Some(PendingPath { doc_id, parent_id: 0, name, anchor: 0, missing: Vec::new() }));
        }

        let parent_id = resolver.id_for_path(parent_path);
        if parent_id == 0 {
            warn!(path = %String::from_utf8_lossy(parent_path), "cannot resolve parent id");
            return Ok(None);
        }
        if parent_id == doc_id {
            return Err(Error::invalid_argument("Document cannot be its own parent"));
        }

        // Walk up until an ancestor already has an entry
        let mut missing: Vec<(DocId, &[u8])> = Vec::new();
        let (mut id, mut path) = (parent_id, parent_path);
        let anchor = loop {
            if self.contains(rtxn, id)? {
                break id;
            }
            if missing.len() >= MAX_PATH_DEPTH {
                return Err(Error::invalid_argument("Path exceeds depth limit"));
            }
            let (grand_path, name) = split_parent(path);
            missing.push((id, name));
            if grand_path.is_empty() {
                break 0;
            }
            id = resolver.id_for_path(grand_path);
            if id == 0 {
                warn!(path = %String::from_utf8_lossy(grand_path), "cannot resolve ancestor id");
                return Ok(None);
            }
            path = grand_path;
        };

        Ok(Some(PendingPath { doc_id, parent_id, name, anchor, missing }))
    }

    /// Writes the entries worked out by `resolve`, ancestors first.
    pub fn insert(&self, wtxn: &mut RwTxn, pending: &PendingPath<'_>) -> Result<()> {
        let mut parent = pending.anchor;
        for &(id, name) in pending.missing.iter().rev() {
            self.add(wtxn, id, parent, name)?;
            parent = id;
        }
        self.add(wtxn, pending.doc_id, pending.parent_id, pending.name)
    }

    fn add(&self, wtxn: &mut RwTxn, id: DocId, parent_id: DocId, name: &[u8]) -> Result<()> {
        if id == 0 || name.is_empty() {
            return Ok(());
        }

        let mut children = self.get_children(wtxn, parent_id)?;
        sorted_id_insert(&mut children, id);
        self.put_children(wtxn, parent_id, &children)?;

        let path = FilePath { parent_id, name: name.to_vec() };
        self.id_filename.put(wtxn, &id, &bincode::serialize(&path)?[..])?;
        Ok(())
    }

    fn put_children(&self, wtxn: &mut RwTxn, parent_id: DocId, children: &[DocId]) -> Result<()> {
        if children.is_empty() {
            self.id_tree.delete(wtxn, &parent_id)?;
        } else {
            self.id_tree.put(wtxn, &parent_id, &PostingCodec::encode(children)[..])?;
        }
        Ok(())
    }

    /// The (parent, name) entry of `id`, if any.
    pub fn file_path(&self, rtxn: &RoTxn, id: DocId) -> Result<Option<FilePath>> {
        if id == 0 {
            return Ok(None);
        }
        match self.id_filename.get(rtxn, &id)? {
            Some(data) => Ok(Some(bincode::deserialize(data)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, rtxn: &RoTxn, id: DocId) -> Result<bool> {
        Ok(id != 0 && self.id_filename.get(rtxn, &id)?.is_some())
    }

    /// Rebuilds the absolute path of `doc_id`. Empty when unknown or when
    /// the parent chain is broken or deeper than `MAX_PATH_DEPTH`.
    pub fn get(&self, rtxn: &RoTxn, doc_id: DocId) -> Result<Vec<u8>> {
        let Some(leaf) = self.file_path(rtxn, doc_id)? else {
            return Ok(Vec::new());
        };

        let mut names: Vec<Vec<u8>> = vec![leaf.name];
        let mut id = leaf.parent_id;
        while id != 0 {
            if names.len() > MAX_PATH_DEPTH {
                warn!(doc_id, "path chain exceeds depth limit");
                return Ok(Vec::new());
            }
            let Some(entry) = self.file_path(rtxn, id)? else {
                warn!(doc_id, missing = id, "broken path chain");
                return Ok(Vec::new());
            };
            names.push(entry.name);
            id = entry.parent_id;
        }

        let mut url = Vec::with_capacity(names.iter().map(|n| n.len() + 1).sum());
        for name in names.iter().rev() {
            url.push(b'/');
            url.extend_from_slice(name);
        }
        Ok(url)
    }

    pub fn get_children(&self, rtxn: &RoTxn, parent_id: DocId) -> Result<Vec<DocId>> {
        match self.id_tree.get(rtxn, &parent_id)? {
            Some(data) => PostingCodec::decode(data),
            None => Ok(Vec::new()),
        }
    }

    /// The child of `parent_id` named `name`, 0 if there is none.
    pub fn get_id(&self, rtxn: &RoTxn, parent_id: DocId, name: &[u8]) -> Result<DocId> {
        if name.is_empty() {
            return Ok(0);
        }
        for child in self.get_children(rtxn, parent_id)? {
            if let Some(path) = self.file_path(rtxn, child)? {
                if path.name == name {
                    return Ok(child);
                }
            }
        }
        Ok(0)
    }

    /// Resolves an absolute path by walking names down from the root.
    pub fn id_for_url(&self, rtxn: &RoTxn, url: &[u8]) -> Result<DocId> {
        if url.first() != Some(&b'/') {
            return Ok(0);
        }
        let mut id = 0;
        for name in url[1..].split(|&b| b == b'/') {
            id = self.get_id(rtxn, id, name)?;
            if id == 0 {
                return Ok(0);
            }
        }
        Ok(id)
    }

    /// Changes the leaf name of `id`; parent links stay untouched.
    pub fn rename(&self, wtxn: &mut RwTxn, id: DocId, new_name: &[u8]) -> Result<()> {
        if new_name.is_empty() || new_name.contains(&b'/') {
            return Err(Error::invalid_argument("Invalid file name"));
        }
        let Some(mut path) = self.file_path(wtxn, id)? else {
            return Err(Error::invalid_state("Renaming a document without a path entry"));
        };
        path.name = new_name.to_vec();
        self.id_filename.put(wtxn, &id, &bincode::serialize(&path)?[..])?;
        Ok(())
    }

    /// Unlinks `id`. Entries that still have children are kept so that the
    /// children keep resolving; returns whether the entry was removed.
    pub fn del<F>(&self, wtxn: &mut RwTxn, id: DocId, delete_folder: F) -> Result<bool>
    where
        F: Fn(&RoTxn, DocId) -> Result<bool>,
    {
        if !self.contains(wtxn, id)? || !self.get_children(wtxn, id)?.is_empty() {
            return Ok(false);
        }
        self.detach(wtxn, id, delete_folder)?;
        self.id_filename.delete(wtxn, &id)?;
        Ok(true)
    }

    /// Takes `id` out of its parent's child set, keeping its own entry.
    ///
    /// When the parent is left without children and `delete_folder` agrees,
    /// the parent is removed too, and so on upwards.
    pub fn detach<F>(&self, wtxn: &mut RwTxn, id: DocId, delete_folder: F) -> Result<()>
    where
        F: Fn(&RoTxn, DocId) -> Result<bool>,
    {
        let mut current = id;
        for _ in 0..MAX_PATH_DEPTH {
            let Some(path) = self.file_path(wtxn, current)? else {
                break;
            };

            let mut siblings = self.get_children(wtxn, path.parent_id)?;
            sorted_id_remove(&mut siblings, current);
            self.put_children(wtxn, path.parent_id, &siblings)?;
            if current != id {
                self.id_filename.delete(wtxn, &current)?;
            }

            if !siblings.is_empty() || path.parent_id == 0 || !delete_folder(&**wtxn, path.parent_id)? {
                break;
            }
            current = path.parent_id;
        }
        Ok(())
    }

    /// `id` followed by all of its descendants, ascending.
    pub fn iter(&self, rtxn: &RoTxn, id: DocId) -> Result<Vec<DocId>> {
        if id == 0 {
            return Ok(Vec::new());
        }

        // A corrupt tree may reach an id twice or loop back on itself
        let mut visited = RoaringTreemap::new();
        visited.insert(id);
        let mut stack = vec![(id, 0usize)];
        while let Some((parent, depth)) = stack.pop() {
            if depth >= MAX_PATH_DEPTH {
                warn!(parent, "descendant walk exceeds depth limit");
                continue;
            }
            for child in self.get_children(rtxn, parent)? {
                if child != 0 && visited.insert(child) {
                    stack.push((child, depth + 1));
                }
            }
        }

        Ok(visited.iter().collect())
    }

    /// id -> rebuilt path for every id in the tree.
    pub fn to_map(&self, rtxn: &RoTxn) -> Result<BTreeMap<DocId, Vec<u8>>> {
        let mut map = BTreeMap::new();
        for entry in self.id_filename.iter(rtxn)? {
            let (id, _) = entry?;
            map.insert(id, Vec::new());
        }
        for (id, url) in map.iter_mut() {
            *url = self.get(rtxn, *id)?;
        }
        Ok(map)
    }

    pub fn tree_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.id_tree, rtxn)
    }

    pub fn filename_size(&self, rtxn: &RoTxn) -> Result<SubDatabaseSize> {
        logical_size(self.id_filename, rtxn)
    }
}

fn validate_url(doc_id: DocId, url: &[u8]) -> Result<()> {
    if doc_id == 0 {
        return Err(Error::invalid_argument("Document id must be non-zero"));
    }
    if url.first() != Some(&b'/') || url.ends_with(b"/") {
        return Err(Error::invalid_argument("Path must be absolute without a trailing slash"));
    }
    if url[1..].split(|&b| b == b'/').any(|segment| segment.is_empty()) {
        return Err(Error::invalid_argument("Path contains an empty component"));
    }
    Ok(())
}

/// Splits `/a/b/c` into (`/a/b`, `c`); the parent of `/a` is empty.
fn split_parent(url: &[u8]) -> (&[u8], &[u8]) {
    match url.iter().rposition(|&b| b == b'/') {
        Some(pos) => (&url[..pos], &url[pos + 1..]),
        None => (&[], url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use crate::storage::env::testing::temp_env;

    fn path_id(path: &[u8]) -> DocId {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        hasher.finish() | 1
    }

    fn url_db() -> (tempfile::TempDir, heed::Env, DocumentUrlDb) {
        let (dir, env, dbis) = temp_env();
        (dir, env, DocumentUrlDb::new(dbis.id_tree, dbis.id_filename))
    }

    #[test]
    fn split_parent_handles_root_level() {
        assert_eq!(split_parent(b"/a/b/c"), (&b"/a/b"[..], &b"c"[..]));
        assert_eq!(split_parent(b"/a"), (&b""[..], &b"a"[..]));
    }

    #[test]
    fn put_creates_ancestors() {
        let (_dir, env, db) = url_db();
        let id = path_id(b"/home/user/file");

        let mut wtxn = env.write_txn().unwrap();
        assert!(db.put(&mut wtxn, id, b"/home/user/file", &path_id).unwrap());
        wtxn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert_eq!(db.get(&rtxn, id).unwrap(), b"/home/user/file".to_vec());
        assert_eq!(db.get(&rtxn, path_id(b"/home/user")).unwrap(), b"/home/user".to_vec());
        assert_eq!(db.get(&rtxn, path_id(b"/home")).unwrap(), b"/home".to_vec());

        assert_eq!(db.get_children(&rtxn, 0).unwrap(), vec![path_id(b"/home")]);
        assert_eq!(db.get_children(&rtxn, path_id(b"/home/user")).unwrap(), vec![id]);
        assert_eq!(db.get_id(&rtxn, path_id(b"/home/user"), b"file").unwrap(), id);
        assert_eq!(db.get_id(&rtxn, path_id(b"/home/user"), b"nope").unwrap(), 0);
        assert_eq!(db.id_for_url(&rtxn, b"/home/user/file").unwrap(), id);
    }

    #[test]
    fn siblings_share_existing_ancestors() {
        let (_dir, env, db) = url_db();

        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, path_id(b"/a/b/one"), b"/a/b/one", &path_id).unwrap();
        db.put(&mut wtxn, path_id(b"/a/b/two"), b"/a/b/two", &path_id).unwrap();
        db.put(&mut wtxn, path_id(b"/a/c"), b"/a/c", &path_id).unwrap();

        let mut expected = vec![path_id(b"/a/b/one"), path_id(b"/a/b/two")];
        expected.sort_unstable();
        assert_eq!(db.get_children(&wtxn, path_id(b"/a/b")).unwrap(), expected);
        assert_eq!(db.get_children(&wtxn, path_id(b"/a")).unwrap().len(), 2);
        assert_eq!(db.get_children(&wtxn, 0).unwrap(), vec![path_id(b"/a")]);
        assert_eq!(db.get(&wtxn, path_id(b"/a/c")).unwrap(), b"/a/c".to_vec());
    }

    #[test]
    fn invalid_urls_are_rejected() {
        let (_dir, env, db) = url_db();
        let mut wtxn = env.write_txn().unwrap();

        assert!(db.put(&mut wtxn, 1, b"", &path_id).is_err());
        assert!(db.put(&mut wtxn, 1, b"relative/path", &path_id).is_err());
        assert!(db.put(&mut wtxn, 1, b"/trailing/", &path_id).is_err());
        assert!(db.put(&mut wtxn, 1, b"/double//slash", &path_id).is_err());
        assert!(db.put(&mut wtxn, 0, b"/zero", &path_id).is_err());
    }

    #[test]
    fn unresolvable_parent_is_reported() {
        let (_dir, env, db) = url_db();
        let mut wtxn = env.write_txn().unwrap();

        let resolver = |_: &[u8]| 0u64;
        assert!(!db.put(&mut wtxn, 5, b"/gone/file", &resolver).unwrap());
    }

    #[test]
    fn rename_changes_leaf_only() {
        let (_dir, env, db) = url_db();
        let id = path_id(b"/docs/old");

        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, id, b"/docs/old", &path_id).unwrap();
        db.rename(&mut wtxn, id, b"new").unwrap();

        assert_eq!(db.get(&wtxn, id).unwrap(), b"/docs/new".to_vec());
        assert_eq!(db.get_children(&wtxn, path_id(b"/docs")).unwrap(), vec![id]);
        assert_eq!(db.get_id(&wtxn, path_id(b"/docs"), b"new").unwrap(), id);
        assert!(db.rename(&mut wtxn, 42, b"x").is_err());
    }

    #[test]
    fn unresolvable_ancestor_writes_nothing() {
        let (_dir, env, db) = url_db();
        let resolver = |path: &[u8]| if path == b"/gone" { 0 } else { path_id(path) };

        let mut wtxn = env.write_txn().unwrap();
        assert!(db.resolve(&wtxn, 9, b"/gone/sub/file", &resolver).unwrap().is_none());
        assert!(!db.put(&mut wtxn, 9, b"/gone/sub/file", &resolver).unwrap());

        assert!(!db.contains(&wtxn, path_id(b"/gone/sub")).unwrap());
        assert!(!db.contains(&wtxn, 9).unwrap());
        assert!(db.get_children(&wtxn, 0).unwrap().is_empty());
    }

    #[test]
    fn resolve_stops_at_existing_ancestor() {
        let (_dir, env, db) = url_db();

        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, path_id(b"/a"), b"/a", &path_id).unwrap();

        let pending = db.resolve(&wtxn, 7, b"/a/b/c", &path_id).unwrap().unwrap();
        assert_eq!(pending.parent_id, path_id(b"/a/b"));
        assert_eq!(pending.name, b"c");
        assert!(!db.contains(&wtxn, path_id(b"/a/b")).unwrap());

        db.insert(&mut wtxn, &pending).unwrap();
        assert_eq!(db.get(&wtxn, 7).unwrap(), b"/a/b/c".to_vec());
        assert_eq!(db.get_children(&wtxn, path_id(b"/a")).unwrap(), vec![path_id(b"/a/b")]);
    }

    #[test]
    fn del_keeps_entries_with_children() {
        let (_dir, env, db) = url_db();
        let dir = path_id(b"/dir");
        let file = path_id(b"/dir/file");

        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, file, b"/dir/file", &path_id).unwrap();

        assert!(!db.del(&mut wtxn, dir, |_, _| Ok(false)).unwrap());
        assert_eq!(db.get(&wtxn, file).unwrap(), b"/dir/file".to_vec());

        assert!(db.del(&mut wtxn, file, |_, _| Ok(false)).unwrap());
        assert!(db.get(&wtxn, file).unwrap().is_empty());
        assert!(db.contains(&wtxn, dir).unwrap());

        assert!(db.del(&mut wtxn, dir, |_, _| Ok(false)).unwrap());
        assert!(db.get_children(&wtxn, 0).unwrap().is_empty());
    }

    #[test]
    fn del_can_prune_empty_folders() {
        let (_dir, env, db) = url_db();
        let file = path_id(b"/x/y/file");

        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, file, b"/x/y/file", &path_id).unwrap();
        assert!(db.del(&mut wtxn, file, |_, _| Ok(true)).unwrap());

        assert!(!db.contains(&wtxn, path_id(b"/x/y")).unwrap());
        assert!(!db.contains(&wtxn, path_id(b"/x")).unwrap());
        assert!(db.get_children(&wtxn, 0).unwrap().is_empty());
    }

    #[test]
    fn iter_lists_descendants() {
        let (_dir, env, db) = url_db();

        let mut wtxn = env.write_txn().unwrap();
        for url in [&b"/r/a/1"[..], b"/r/a/2", b"/r/b", b"/other"] {
            db.put(&mut wtxn, path_id(url), url, &path_id).unwrap();
        }

        let mut expected = vec![
            path_id(b"/r"),
            path_id(b"/r/a"),
            path_id(b"/r/a/1"),
            path_id(b"/r/a/2"),
            path_id(b"/r/b"),
        ];
        expected.sort_unstable();
        assert_eq!(db.iter(&wtxn, path_id(b"/r")).unwrap(), expected);
        assert_eq!(db.iter(&wtxn, path_id(b"/other")).unwrap(), vec![path_id(b"/other")]);
    }

    #[test]
    fn cyclic_chain_yields_empty_path() {
        let (_dir, env, db) = url_db();

        let mut wtxn = env.write_txn().unwrap();
        let a = FilePath { parent_id: 2, name: b"a".to_vec() };
        let b = FilePath { parent_id: 1, name: b"b".to_vec() };
        db.id_filename.put(&mut wtxn, &1, &bincode::serialize(&a).unwrap()[..]).unwrap();
        db.id_filename.put(&mut wtxn, &2, &bincode::serialize(&b).unwrap()[..]).unwrap();

        assert!(db.get(&wtxn, 1).unwrap().is_empty());
    }

    #[test]
    fn iter_survives_branching_cycles() {
        let (_dir, env, db) = url_db();

        // 1 -> {2, 3}, 2 -> {4}, 3 -> {4}, 4 -> {2, 3}
        let mut wtxn = env.write_txn().unwrap();
        db.put_children(&mut wtxn, 1, &[2, 3]).unwrap();
        db.put_children(&mut wtxn, 2, &[4]).unwrap();
        db.put_children(&mut wtxn, 3, &[4]).unwrap();
        db.put_children(&mut wtxn, 4, &[2, 3]).unwrap();

        assert_eq!(db.iter(&wtxn, 1).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(db.iter(&wtxn, 4).unwrap(), vec![2, 3, 4]);
    }
}
