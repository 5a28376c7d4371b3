use newsdesk::editorial::{self, PostDraft, StatusFilter};
use newsdesk::{DataObject, DataObjectOps, Error};
use newsdesk_test_helper::*;
use pretty_assertions::assert_eq;

fn titles(posts: &[newsdesk::models::Post]) -> Vec<&str> {
    posts.iter().map(|p| p.title.as_str()).collect()
}

#[test_log::test]
fn status_filter_lists_matching_live_posts() {
    let conn = sqlite_connection();
    publish_post(&conn, "Budget passes", "Politics");
    draft_post(&conn, "Unfinished profile", "Business");
    let trashed = publish_post(&conn, "Retracted story", "Politics");
    editorial::trash_post(&conn, post_id(&trashed)).unwrap();
    publish_post(&conn, "New ministry", "Diplomacy");

    let all = editorial::list_posts(&conn, StatusFilter::All).unwrap();
    assert_eq!(
        titles(&all),
        vec!["New ministry", "Unfinished profile", "Budget passes"]
    );
    let published = editorial::list_posts(&conn, StatusFilter::Published).unwrap();
    assert_eq!(titles(&published), vec!["New ministry", "Budget passes"]);
    let drafts = editorial::list_posts(&conn, StatusFilter::Draft).unwrap();
    assert_eq!(titles(&drafts), vec!["Unfinished profile"]);
}

#[test]
fn trash_restore_destroy() {
    let conn = sqlite_connection();
    let post = publish_post(&conn, "Water prices", "Business");
    let id = post_id(&post);

    assert!(matches!(
        editorial::destroy_post(&conn, id),
        Err(Error::NotInTrash(_))
    ));

    let trashed = editorial::trash_post(&conn, id).unwrap();
    let deleted_at = trashed.deleted_at.unwrap();
    assert!(trashed.is_published);
    // Trashing again keeps the first trash time.
    let again = editorial::trash_post(&conn, id).unwrap();
    assert_eq!(again.deleted_at, Some(deleted_at));
    assert_eq!(titles(&editorial::list_trash(&conn).unwrap()), vec!["Water prices"]);

    let restored = editorial::restore_post(&conn, id).unwrap();
    assert_eq!(restored.deleted_at, None);
    assert!(restored.is_published);
    assert!(editorial::list_trash(&conn).unwrap().is_empty());

    editorial::trash_post(&conn, id).unwrap();
    editorial::destroy_post(&conn, id).unwrap();
    assert!(newsdesk::models::Post::try_get(&conn, id).unwrap().is_none());
    assert!(matches!(
        editorial::get_post(&conn, id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn slugs_are_unique_per_category() {
    let conn = sqlite_connection();
    let first = publish_post(&conn, "Election Day!", "Politics");
    let second = publish_post(&conn, "Election day", "Politics");
    let third = publish_post(&conn, "Election day", "politics");
    let elsewhere = publish_post(&conn, "Election day", "Business");
    assert_eq!(first.slug, "election-day");
    assert_eq!(second.slug, "election-day-2");
    assert_eq!(third.slug, "election-day-3");
    assert_eq!(elsewhere.slug, "election-day");
    assert_eq!(second.path(), "/politics/election-day-2");
}

#[test]
fn update_keeps_own_slug_and_likes() {
    let conn = sqlite_connection();
    let post = publish_post(&conn, "Harvest report", "Business");
    let id = post_id(&post);
    let mut draft = PostDraft::from_post(&post);
    draft.summary = "A better summary".to_string();
    draft.image_url = Some("/storage/post-images/1-abcdefg.png".to_string());
    let updated = editorial::update_post(&conn, id, &draft).unwrap();
    assert_eq!(updated.slug, "harvest-report");
    assert_eq!(updated.summary, "A better summary");
    assert_eq!(updated.likes, 0);
    assert!(updated.updated_at.is_some());
}

#[test]
fn retitled_post_without_slug_keeps_its_url() {
    let conn = sqlite_connection();
    let post = publish_post(&conn, "Harvest report", "Business");
    let id = post_id(&post);
    let mut draft = PostDraft::from_post(&post);
    draft.title = "Harvest report (updated)".to_string();
    draft.slug = None;
    let updated = editorial::update_post(&conn, id, &draft).unwrap();
    assert_eq!(updated.title, "Harvest report (updated)");
    assert_eq!(updated.slug, "harvest-report");
    assert_eq!(updated.path(), post.path());

    draft.slug = Some("Harvest Report 2025".to_string());
    let renamed = editorial::update_post(&conn, id, &draft).unwrap();
    assert_eq!(renamed.slug, "harvest-report-2025");
}

#[test]
fn invalid_drafts_are_refused() {
    let conn = sqlite_connection();
    let blank = PostDraft::new("  ", "Politics", "summary", "content");
    assert!(matches!(
        editorial::create_post(&conn, None, &blank),
        Err(Error::Validation { field: "title", .. })
    ));
    let symbols = PostDraft::new("!!!", "Politics", "summary", "content");
    assert!(matches!(
        editorial::create_post(&conn, None, &symbols),
        Err(Error::Validation { field: "slug", .. })
    ));
    let mut bad_image = PostDraft::new("Title", "Politics", "summary", "content");
    bad_image.image_url = Some("javascript:alert(1)".to_string());
    assert!(matches!(
        editorial::create_post(&conn, None, &bad_image),
        Err(Error::Validation {
            field: "image_url",
            ..
        })
    ));
}

#[test]
fn publish_and_unpublish() {
    let conn = sqlite_connection();
    let post = draft_post(&conn, "Quiet draft", "Tech");
    assert!(!post.is_published);
    let post = editorial::set_published(&conn, post_id(&post), true).unwrap();
    assert!(post.is_public());
    let post = editorial::set_published(&conn, post_id(&post), false).unwrap();
    assert!(!post.is_public());
    assert!(matches!(
        editorial::set_published(&conn, 999, true),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn dashboard_counts() {
    let conn = sqlite_connection();
    publish_post(&conn, "One", "Politics");
    publish_post(&conn, "Two", "Politics");
    draft_post(&conn, "Three", "Politics");
    let gone = draft_post(&conn, "Four", "Politics");
    editorial::trash_post(&conn, post_id(&gone)).unwrap();
    newsdesk::subscribers::subscribe(&conn, "reader@example.com").unwrap();

    let stats = editorial::dashboard_stats(&conn).unwrap();
    assert_eq!(
        stats,
        editorial::DashboardStats {
            published: 2,
            drafts: 1,
            trashed: 1,
            comments: 0,
            subscribers: 1,
        }
    );
}

#[test]
fn status_filter_parses() {
    assert_eq!("Drafts".parse::<StatusFilter>().unwrap(), StatusFilter::Draft);
    assert_eq!(StatusFilter::Published.to_string(), "published");
    assert!("archived".parse::<StatusFilter>().is_err());
}

#[test]
fn post_table_name() {
    assert_eq!(newsdesk::models::Post::TABLE, "posts");
}
