//! Plain-text rendering of list and detail views.

use std::io::{self, Write};

use petboard_core::{DetailView, ListView};
use petboard_proto::{Comment, ForumPost};

/// Write one list page: a header, one line per post and any stored error.
pub fn list(out: &mut impl Write, view: &ListView) -> io::Result<()> {
    writeln!(
        out,
        "{} forum posts, page {} of {} ({} total)",
        view.kind(),
        view.page() + 1,
        view.total_pages(),
        view.total_elements()
    )?;
    for post in view.content() {
        summary(out, post)?;
    }
    if view.content().is_empty() {
        writeln!(out, "  (no posts)")?;
    }
    error(out, view.error())
}

/// Write the focused post, its like state and the current comment page.
pub fn detail(out: &mut impl Write, view: &DetailView) -> io::Result<()> {
    let Some(post) = view.forum() else {
        writeln!(out, "(no forum post loaded)")?;
        return error(out, view.error());
    };

    writeln!(out, "#{} {}", post.forum_id, post.title)?;
    writeln!(out, "by {}", post.author_name())?;
    if !post.tags.is_empty() {
        writeln!(out, "tags: {}", post.tags.join(", "))?;
    }
    let liked = if view.is_liked() { " (liked)" } else { "" };
    writeln!(out, "{} likes{liked}, {} comments", post.likes_count, post.comments_count)?;
    writeln!(out)?;
    writeln!(out, "{}", post.content)?;
    writeln!(out)?;

    writeln!(
        out,
        "comments, page {} of {}:",
        view.comment_page() + 1,
        view.total_comment_pages()
    )?;
    for comment in view.comments() {
        thread(out, comment, 1)?;
    }
    error(out, view.error())
}

/// Write the app's status message, if any.
pub fn status(out: &mut impl Write, message: Option<&str>) -> io::Result<()> {
    match message {
        Some(message) => writeln!(out, "{message}"),
        None => Ok(()),
    }
}

fn summary(out: &mut impl Write, post: &ForumPost) -> io::Result<()> {
    writeln!(
        out,
        "  #{:<5} {}  [{} likes, {} comments]",
        post.forum_id, post.title, post.likes_count, post.comments_count
    )
}

fn thread(out: &mut impl Write, comment: &Comment, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    writeln!(
        out,
        "{indent}[{}] user {}: {}",
        comment.comment_id, comment.author_user_id, comment.text
    )?;
    for reply in &comment.replies {
        thread(out, reply, depth + 1)?;
    }
    Ok(())
}

fn error(out: &mut impl Write, error: Option<&str>) -> io::Result<()> {
    match error {
        Some(error) => writeln!(out, "error: {error}"),
        None => Ok(()),
    }
}
