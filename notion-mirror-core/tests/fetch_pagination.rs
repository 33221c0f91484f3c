use notion_mirror_core::contract::{Block, BlockPage, MockWorkspaceApi, Page};
use notion_mirror_core::fetch::PaginatedFetcher;
use notion_mirror_core::rate_limit::RateLimiter;
use notion_mirror_core::Error;
use serde_json::json;
use std::sync::Arc;

fn numbered_blocks(n: usize) -> Vec<Block> {
    (0..n)
        .map(|i| Block::new(format!("b{i}"), "paragraph", json!({ "rich_text": [] })))
        .collect()
}

/// Mock that serves `items` in pages of the requested size, using the offset
/// as the cursor.
fn paged_api(items: Vec<Block>) -> MockWorkspaceApi {
    let mut api = MockWorkspaceApi::new();
    api.expect_list_block_children()
        .returning(move |_, cursor, page_size| {
            let start = cursor.map(|c| c.parse::<usize>().unwrap()).unwrap_or(0);
            let end = (start + page_size as usize).min(items.len());
            let has_more = end < items.len();
            Ok(BlockPage {
                results: items[start..end].to_vec(),
                next_cursor: has_more.then(|| end.to_string()),
                has_more,
            })
        });
    api
}

#[tokio::test(start_paused = true)]
async fn concatenated_pages_equal_the_full_child_list() {
    for n in [0usize, 1, 2, 5, 17] {
        for page_size in 1..=6u32 {
            let items = numbered_blocks(n);
            let fetcher = PaginatedFetcher::new(Arc::new(paged_api(items.clone())), RateLimiter::default())
                .with_page_size(page_size);

            let fetched = fetcher.fetch_all_children("root").await.unwrap();
            assert_eq!(
                fetched, items,
                "n={n} page_size={page_size}: children must arrive complete and in order"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn issues_one_request_per_page() {
    let mut api = MockWorkspaceApi::new();
    api.expect_list_block_children()
        .withf(|id, cursor, _| id == "root" && cursor.is_none())
        .times(1)
        .returning(|_, _, _| {
            Ok(BlockPage {
                results: numbered_blocks(2),
                next_cursor: Some("c1".into()),
                has_more: true,
            })
        });
    api.expect_list_block_children()
        .withf(|id, cursor, _| id == "root" && cursor.as_deref() == Some("c1"))
        .times(1)
        .returning(|_, _, _| {
            Ok(BlockPage {
                results: vec![Block::child_page("c", "Child")],
                next_cursor: None,
                has_more: false,
            })
        });

    let fetcher = PaginatedFetcher::new(Arc::new(api), RateLimiter::default());
    let fetched = fetcher.fetch_all_children("root").await.unwrap();

    let ids: Vec<_> = fetched.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, ["b0", "b1", "c"]);
}

#[tokio::test(start_paused = true)]
async fn transport_error_on_a_later_page_is_returned_unchanged() {
    let mut api = MockWorkspaceApi::new();
    api.expect_list_block_children()
        .withf(|_, cursor, _| cursor.is_none())
        .times(1)
        .returning(|_, _, _| {
            Ok(BlockPage {
                results: numbered_blocks(1),
                next_cursor: Some("c1".into()),
                has_more: true,
            })
        });
    api.expect_list_block_children()
        .withf(|_, cursor, _| cursor.as_deref() == Some("c1"))
        .times(1)
        .returning(|_, _, _| {
            Err(Error::Api {
                status: 429,
                url: "https://api.notion.com/v1/blocks/root/children".into(),
                body: "rate_limited".into(),
            })
        });

    let fetcher = PaginatedFetcher::new(Arc::new(api), RateLimiter::default());
    match fetcher.fetch_all_children("root").await {
        Err(Error::Api { status, body, .. }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate_limited");
        }
        other => panic!("expected the API error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn retrieve_page_passes_through_the_limiter() {
    let mut api = MockWorkspaceApi::new();
    api.expect_retrieve_page()
        .withf(|id| id == "p1")
        .times(4)
        .returning(|id| {
            Ok(Page {
                id: id.to_owned(),
                ..Page::default()
            })
        });

    let fetcher = PaginatedFetcher::new(Arc::new(api), RateLimiter::default());
    let start = tokio::time::Instant::now();
    for _ in 0..4 {
        let page = fetcher.retrieve_page("p1").await.unwrap();
        assert_eq!(page.id, "p1");
    }
    // The fourth call has to wait for the first token to come back.
    assert!(start.elapsed() >= std::time::Duration::from_secs(1));
}
