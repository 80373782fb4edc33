//! A complete simulated system: the app runtime over the in-memory backend.

use petboard_app::{ForumApp, Runtime};
use petboard_client::ClientConfig;
use petboard_core::{CommentDraft, ForumDraft, SharedIdentity, Viewer};
use petboard_proto::{Comment, CommentId, ForumId, UserId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::Operation;
use crate::{SimBackend, SystemSnapshot};

const TAGS: [&str; 3] = ["dog", "cat", "bird"];

/// The app runtime wired to a seeded [`SimBackend`].
///
/// The backend answers instantly, so each request is processed by the server
/// at the moment its completion is delivered. Operations interleave intents
/// with [`Operation::Step`] deliveries to explore reorderings.
pub struct SimWorld {
    runtime: Runtime<SimBackend>,
    backend: SimBackend,
    viewer: Viewer,
    created: u32,
}

impl SimWorld {
    /// The signed-in user.
    pub const VIEWER: UserId = 1;
    /// Another user who authors, likes and comments on fixture posts.
    pub const OTHER: UserId = 2;

    /// World with a fixture derived from `seed`.
    ///
    /// Pages are small (3 posts, 2 comments) so pagination is exercised.
    pub fn new(seed: u64) -> Self {
        let viewer = Viewer::new(Self::VIEWER, "model-token");
        let backend = SimBackend::with_seed(SharedIdentity::signed_in(viewer.clone()), seed);
        seed_fixture(&backend, seed);

        let config = ClientConfig { page_size: 3, comment_page_size: 2, ..ClientConfig::default() };
        let app = ForumApp::new(Some(Self::VIEWER), &config);
        Self { runtime: Runtime::new(app, backend.clone()), backend, viewer, created: 0 }
    }

    /// Apply one operation.
    pub async fn apply(&mut self, op: &Operation) {
        match *op {
            Operation::LoadList { list } => self.runtime.apply(|app| app.load_list(list.into())),
            Operation::SetPage { list, page } => {
                self.runtime.apply(|app| app.set_page(list.into(), u32::from(page % 4)));
            },
            Operation::SetSort { list, sort } => {
                let (sort_by, sort_dir) = sort.params();
                self.runtime.apply(|app| app.set_sort(list.into(), sort_by, sort_dir));
            },
            Operation::Search { list, term } => {
                self.runtime.apply(|app| app.set_search_term(list.into(), term.as_str()));
            },
            Operation::SearchTags { list, term } => {
                self.runtime.apply(|app| app.set_tag_search_term(list.into(), term.as_str()));
            },
            Operation::OpenForum { slot } => {
                if let Some(forum_id) = self.forum_at(slot) {
                    self.runtime.apply(|app| app.open_forum(forum_id));
                }
            },
            Operation::CloseForum => self.runtime.apply(ForumApp::close_forum),
            Operation::LoadComments { page } => {
                self.runtime.apply(|app| app.load_comments(u32::from(page % 3)));
            },
            Operation::ToggleLike => self.runtime.apply(ForumApp::toggle_like),
            Operation::AddComment { reply_to } => {
                let draft = match reply_to.and_then(|slot| self.comment_at(slot)) {
                    Some(parent_id) => CommentDraft::reply(parent_id, "Same here"),
                    None => CommentDraft::new("Has anyone tried this?"),
                };
                self.runtime.apply(|app| app.add_comment(&draft));
            },
            Operation::EditComment { slot } => {
                if let Some(comment_id) = self.comment_at(slot) {
                    self.runtime.apply(|app| app.update_comment(comment_id, "Edited"));
                }
            },
            Operation::DeleteComment { slot } => {
                if let Some(comment_id) = self.comment_at(slot) {
                    self.runtime.apply(|app| app.delete_comment(comment_id));
                }
            },
            Operation::CreateForum { tags } => {
                self.created += 1;
                let draft = ForumDraft {
                    title: format!("Model post {}", self.created),
                    content: "<p>Posted by the model</p>".to_string(),
                    tags: tags.as_str().to_string(),
                };
                self.runtime.apply(|app| app.create_forum(&draft));
            },
            Operation::UpdateForum { slot } => {
                if let Some(forum_id) = self.forum_at(slot) {
                    let draft = ForumDraft {
                        title: format!("Edited post {forum_id}"),
                        content: "<p>Edited</p>".to_string(),
                        tags: "dog".to_string(),
                    };
                    self.runtime.apply(|app| app.update_forum(forum_id, &draft));
                }
            },
            Operation::DeleteForum { slot } => {
                if let Some(forum_id) = self.forum_at(slot) {
                    self.runtime.apply(|app| app.delete_forum(forum_id));
                }
            },
            Operation::SignOut => {
                self.backend.identity().set(None);
                self.runtime.apply(|app| app.set_viewer(None));
            },
            Operation::SignIn => {
                self.backend.identity().set(Some(self.viewer.clone()));
                self.runtime.apply(|app| app.set_viewer(Some(Self::VIEWER)));
            },
            Operation::Step => {
                self.runtime.step().await;
            },
            Operation::Settle => self.runtime.settle().await,
        }
    }

    /// Deliver every outstanding request.
    pub async fn settle(&mut self) {
        self.runtime.settle().await;
    }

    /// Observable client state.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_runtime(&self.runtime)
    }

    /// Observable client state plus the server's counters.
    pub fn settled_snapshot(&self) -> SystemSnapshot {
        self.snapshot().with_backend(&self.backend)
    }

    /// The app under test.
    pub fn app(&self) -> &ForumApp {
        self.runtime.app()
    }

    /// The runtime driving the app.
    pub fn runtime(&mut self) -> &mut Runtime<SimBackend> {
        &mut self.runtime
    }

    /// The simulated server.
    pub fn backend(&self) -> &SimBackend {
        &self.backend
    }

    fn forum_at(&self, slot: u8) -> Option<ForumId> {
        let ids = self.backend.forum_ids();
        pick(&ids, slot)
    }

    /// Comments and replies on screen, depth first.
    fn comment_at(&self, slot: u8) -> Option<CommentId> {
        fn walk(comments: &[Comment], out: &mut Vec<CommentId>) {
            for comment in comments {
                out.push(comment.comment_id);
                walk(&comment.replies, out);
            }
        }
        let mut ids = Vec::new();
        walk(self.app().detail().comments(), &mut ids);
        pick(&ids, slot)
    }
}

fn pick<T: Copy>(items: &[T], slot: u8) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    items.get(usize::from(slot) % items.len()).copied()
}

/// Populate `backend` with posts by both users, likes, featured posts and
/// comment threads.
fn seed_fixture(backend: &SimBackend, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let posts = rng.gen_range(4..=10);

    for n in 0..posts {
        let author = if rng.gen_bool(0.5) { SimWorld::VIEWER } else { SimWorld::OTHER };
        let tag = TAGS[rng.gen_range(0..TAGS.len())];
        let forum_id = backend.seed_forum(author, &format!("{tag} question {n}"), &[tag]);

        if rng.gen_bool(0.4) {
            backend.seed_like(forum_id, SimWorld::OTHER);
        }
        if rng.gen_bool(0.3) {
            backend.seed_like(forum_id, SimWorld::VIEWER);
        }
        if rng.gen_bool(0.3) {
            backend.feature(forum_id);
        }

        let mut thread: Vec<CommentId> = Vec::new();
        for _ in 0..rng.gen_range(0..5) {
            let author = if rng.gen_bool(0.5) { SimWorld::VIEWER } else { SimWorld::OTHER };
            let parent = if !thread.is_empty() && rng.gen_bool(0.4) {
                Some(thread[rng.gen_range(0..thread.len())])
            } else {
                None
            };
            if let Some(comment_id) = backend.seed_comment(forum_id, author, "Seeded", parent) {
                thread.push(comment_id);
            }
        }
    }
}
