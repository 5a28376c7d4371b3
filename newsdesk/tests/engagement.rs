use newsdesk::engagement::{self, CommentAuthor};
use newsdesk::settings::{self, SettingFlag};
use newsdesk::{editorial, Error};
use newsdesk_test_helper::*;
use pretty_assertions::assert_eq;

#[test_log::test]
fn like_counts_once_per_visitor() {
    let mut conn = sqlite_connection();
    let post = publish_post(&conn, "Festival returns", "Politics");
    let id = post_id(&post);

    assert_eq!(engagement::like_article(&mut conn, id, "visitor-a").unwrap(), 1);
    assert!(engagement::has_liked(&conn, id, "visitor-a").unwrap());
    assert!(matches!(
        engagement::like_article(&mut conn, id, "visitor-a"),
        Err(Error::AlreadyLiked)
    ));
    assert_eq!(editorial::get_post(&conn, id).unwrap().likes, 1);

    assert_eq!(engagement::like_article(&mut conn, id, "visitor-b").unwrap(), 2);
    assert!(!engagement::has_liked(&conn, id, "visitor-c").unwrap());
}

#[test]
fn likes_survive_edits() {
    let mut conn = sqlite_connection();
    let post = publish_post(&conn, "Road works", "Politics");
    let id = post_id(&post);
    engagement::like_article(&mut conn, id, "visitor-a").unwrap();
    let draft = editorial::PostDraft::from_post(&post);
    let updated = editorial::update_post(&conn, id, &draft).unwrap();
    assert_eq!(updated.likes, 1);
}

#[test]
fn only_public_posts_can_be_liked() {
    let mut conn = sqlite_connection();
    let draft = draft_post(&conn, "Not out yet", "Tech");
    assert!(matches!(
        engagement::like_article(&mut conn, post_id(&draft), "visitor-a"),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        engagement::like_article(&mut conn, 404, "visitor-a"),
        Err(Error::NotFound(_))
    ));
    let post = publish_post(&conn, "Out now", "Tech");
    assert!(matches!(
        engagement::like_article(&mut conn, post_id(&post), "  "),
        Err(Error::Validation { field: "visitor", .. })
    ));
    assert_eq!(editorial::get_post(&conn, post_id(&draft)).unwrap().likes, 0);
}

#[test]
fn new_comment_is_listed_first() {
    let conn = sqlite_connection();
    let post = publish_post(&conn, "Hospital wing", "Politics");
    let id = post_id(&post);
    let member = reader(&conn, "amina@example.com");

    engagement::add_comment(&conn, id, &CommentAuthor::Guest(None), "Older").unwrap();
    let added = engagement::add_comment(
        &conn,
        id,
        &CommentAuthor::Member(member),
        "  Newest comment  ",
    )
    .unwrap();
    assert_eq!(added.content, "Newest comment");
    assert_eq!(added.author, "Anonymous");

    let comments = engagement::list_comments(&conn, id).unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id, added.id);
    assert_eq!(comments[1].content, "Older");
}

#[test]
fn comments_are_validated() {
    let conn = sqlite_connection();
    let post = publish_post(&conn, "Stadium vote", "Politics");
    let id = post_id(&post);
    let guest = CommentAuthor::Guest(Some("Jean".to_string()));
    assert!(matches!(
        engagement::add_comment(&conn, id, &guest, "   "),
        Err(Error::Validation {
            field: "content",
            ..
        })
    ));
    let long = "x".repeat(engagement::MAX_COMMENT_CHARS + 1);
    assert!(matches!(
        engagement::add_comment(&conn, id, &guest, &long),
        Err(Error::Validation {
            field: "content",
            ..
        })
    ));
    let longest = "x".repeat(engagement::MAX_COMMENT_CHARS);
    engagement::add_comment(&conn, id, &guest, &longest).unwrap();
}

#[test]
fn comments_can_be_switched_off() {
    let conn = sqlite_connection();
    let post = publish_post(&conn, "Tax changes", "Business");
    let id = post_id(&post);
    assert!(!settings::toggle(&conn, SettingFlag::PublicComments).unwrap());
    assert!(matches!(
        engagement::add_comment(&conn, id, &CommentAuthor::Guest(None), "Hello"),
        Err(Error::CommentsDisabled)
    ));
    assert!(engagement::list_comments(&conn, id).unwrap().is_empty());
    settings::set_flag(&conn, SettingFlag::PublicComments, Some(true)).unwrap();
    engagement::add_comment(&conn, id, &CommentAuthor::Guest(None), "Hello").unwrap();
}

#[test]
fn destroying_a_post_removes_its_comments() {
    let mut conn = sqlite_connection();
    let post = publish_post(&conn, "Short lived", "Tech");
    let id = post_id(&post);
    engagement::add_comment(&conn, id, &CommentAuthor::Guest(None), "Hmm").unwrap();
    engagement::like_article(&mut conn, id, "visitor-a").unwrap();
    editorial::trash_post(&conn, id).unwrap();
    editorial::destroy_post(&conn, id).unwrap();
    assert!(engagement::list_comments(&conn, id).unwrap().is_empty());
    assert!(!engagement::has_liked(&conn, id, "visitor-a").unwrap());
}
