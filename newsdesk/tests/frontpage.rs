use newsdesk::editorial;
use newsdesk::engagement::{self, CommentAuthor};
use newsdesk::frontpage;
use newsdesk::models::Post;
use newsdesk::Error;
use newsdesk_test_helper::*;
use pretty_assertions::assert_eq;

fn titles(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.title.clone()).collect()
}

fn numbered(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.rev().map(|n| format!("Story {n}")).collect()
}

#[test_log::test]
fn home_page_layout() {
    let conn = sqlite_connection();
    for n in 1..=15 {
        publish_post(&conn, &format!("Story {n}"), "Politics");
    }
    draft_post(&conn, "Not yet", "Politics");

    let home = frontpage::home_page(&conn).unwrap();
    assert_eq!(home.breaking.unwrap().title, "Story 15");
    assert_eq!(titles(&home.top_stories), numbered(11..=14));
    assert_eq!(titles(&home.more_stories), numbered(3..=10));

    assert_eq!(titles(&frontpage::hero(&conn).unwrap()), numbered(13..=15));
}

#[test]
fn empty_home_page() {
    let conn = sqlite_connection();
    let home = frontpage::home_page(&conn).unwrap();
    assert_eq!(home, frontpage::HomePage::default());
}

#[test]
fn latest_is_clamped() {
    let conn = sqlite_connection();
    for n in 1..=10 {
        publish_post(&conn, &format!("Story {n}"), "Tech");
    }
    assert_eq!(
        frontpage::latest(&conn, None).unwrap().len(),
        frontpage::DEFAULT_LATEST as usize
    );
    assert_eq!(titles(&frontpage::latest(&conn, Some(0)).unwrap()), numbered(10..=10));
    assert_eq!(frontpage::latest(&conn, Some(500)).unwrap().len(), 10);
}

#[test]
fn category_listing() {
    let conn = sqlite_connection();
    publish_post(&conn, "Court ruling", "Human Rights");
    publish_post(&conn, "Market day", "Business");
    draft_post(&conn, "Pending appeal", "Human Rights");
    let trashed = publish_post(&conn, "Withdrawn", "Human Rights");
    editorial::trash_post(&conn, post_id(&trashed)).unwrap();
    publish_post(&conn, "Shelter opens", "human rights");

    let page = frontpage::category_page(&conn, "human-rights").unwrap();
    assert_eq!(page.title, "Human rights");
    assert_eq!(page.segment, "human-rights");
    assert_eq!(titles(&page.posts), vec!["Shelter opens", "Court ruling"]);

    let unknown = frontpage::category_page(&conn, "sports").unwrap();
    assert!(unknown.posts.is_empty());
}

#[test]
fn article_by_slug_with_comments() {
    let conn = sqlite_connection();
    let post = publish_post(&conn, "Bridge reopens", "Human Rights");
    let id = post_id(&post);
    engagement::add_comment(&conn, id, &CommentAuthor::Guest(None), "First!").unwrap();
    engagement::add_comment(
        &conn,
        id,
        &CommentAuthor::Guest(Some("Jean".to_string())),
        "Finally",
    )
    .unwrap();

    let page = frontpage::article_by_slug(&conn, "human-rights", "bridge-reopens").unwrap();
    assert_eq!(page.post.title, "Bridge reopens");
    assert!(page.comments_enabled);
    let comments: Vec<(&str, &str)> = page
        .comments
        .iter()
        .map(|c| (c.author.as_str(), c.content.as_str()))
        .collect();
    assert_eq!(comments, vec![("Jean", "Finally"), ("Anonymous", "First!")]);

    assert!(matches!(
        frontpage::article_by_slug(&conn, "politics", "bridge-reopens"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn article_sidebar_excludes_the_article() {
    let conn = sqlite_connection();
    let mut ids = Vec::new();
    for n in 1..=6 {
        ids.push(post_id(&publish_post(&conn, &format!("Story {n}"), "Diplomacy")));
    }
    let page = frontpage::article_by_id(&conn, ids[5]).unwrap();
    assert_eq!(page.post.title, "Story 6");
    assert_eq!(titles(&page.top_stories), numbered(2..=5));

    let page = frontpage::article_by_id(&conn, ids[2]).unwrap();
    assert_eq!(
        titles(&page.top_stories),
        vec!["Story 6", "Story 5", "Story 4", "Story 2"]
    );
}

#[test]
fn unpublished_articles_are_hidden() {
    let conn = sqlite_connection();
    let draft = draft_post(&conn, "Embargoed", "Politics");
    assert!(matches!(
        frontpage::article_by_id(&conn, post_id(&draft)),
        Err(Error::NotFound(_))
    ));
    let post = publish_post(&conn, "Recalled", "Politics");
    editorial::trash_post(&conn, post_id(&post)).unwrap();
    assert!(matches!(
        frontpage::article_by_id(&conn, post_id(&post)),
        Err(Error::NotFound(_))
    ));
    assert!(frontpage::search(&conn, "").unwrap().is_empty());
}

#[test]
fn search_matches_title_or_summary() {
    let conn = sqlite_connection();
    publish_post(&conn, "Zebra crossing repainted", "Politics");
    let mut draft = draft("Council meeting", "Politics").published();
    draft.summary = "Residents ask about the ZEBRA crossing".to_string();
    editorial::create_post(&conn, None, &draft).unwrap();
    draft_post(&conn, "Zebra draft", "Politics");
    publish_post(&conn, "Unrelated", "Politics");
    publish_post(&conn, "100% turnout", "Politics");

    assert_eq!(
        titles(&frontpage::search(&conn, "zebra").unwrap()),
        vec!["Council meeting", "Zebra crossing repainted"]
    );
    assert_eq!(
        titles(&frontpage::search(&conn, "100%").unwrap()),
        vec!["100% turnout"]
    );
    assert_eq!(frontpage::search(&conn, "   ").unwrap().len(), 4);
}

#[test]
fn accented_text_matches_in_any_case() {
    let conn = sqlite_connection();
    publish_post(&conn, "Élection présidentielle au Burundi", "Politics");
    publish_post(&conn, "Budget", "Économie");
    publish_post(&conn, "Lake levels rise", "Politics");

    assert_eq!(
        titles(&frontpage::search(&conn, "élection").unwrap()),
        vec!["Élection présidentielle au Burundi"]
    );
    assert_eq!(
        titles(&frontpage::search(&conn, "PRÉSIDENTIELLE").unwrap()),
        vec!["Élection présidentielle au Burundi"]
    );

    let page = frontpage::category_page(&conn, "économie").unwrap();
    assert_eq!(page.title, "Économie");
    assert_eq!(titles(&page.posts), vec!["Budget"]);

    let article = frontpage::article_by_slug(&conn, "économie", "budget").unwrap();
    assert_eq!(article.post.title, "Budget");
}
