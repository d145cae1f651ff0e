use anyhow::Result;
use clap::Args;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::cli::output::Output;
use crate::config::PoolConfig;
use crate::pool::{DynamicTaskPool, Task};

#[derive(Args)]
pub struct PagesArgs {
    /// Number of pages in the simulated listing
    #[arg(value_name = "COUNT", value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Items on each page (also used as the page's progress weight)
    #[arg(long, default_value = "5")]
    pub per_page: u32,

    /// Simulated fetch latency per page in milliseconds
    #[arg(long, default_value = "20")]
    pub delay_ms: u64,

    /// Make this page fail, which ends discovery there
    #[arg(long)]
    pub fail_page: Option<u32>,

    /// Worker threads (overrides configuration)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct PageRequest {
    number: u32,
    total: u32,
    per_page: u32,
    delay: Duration,
    fail_page: Option<u32>,
}

#[derive(Debug)]
struct Page {
    items: Vec<String>,
    next: Option<u32>,
}

#[derive(Debug, Error)]
#[error("page {0} is unavailable")]
struct PageUnavailable(u32);

fn fetch_page(request: PageRequest) -> Result<Page, PageUnavailable> {
    thread::sleep(request.delay);

    if request.fail_page == Some(request.number) {
        return Err(PageUnavailable(request.number));
    }

    let items = (1..=request.per_page)
        .map(|index| format!("item-{}-{}", request.number, index))
        .collect();
    let next = (request.number < request.total).then_some(request.number + 1);

    Ok(Page { items, next })
}

fn page_task(request: PageRequest) -> Task<Page> {
    Task::call(fetch_page, request)
        .name(format!("Page-{}", request.number))
        .weight(u64::from(request.per_page))
}

pub fn execute(args: PagesArgs, config: PoolConfig, output: &Output) -> Result<()> {
    let config = config.with_workers(args.workers);
    let mut pool: DynamicTaskPool<Page> = DynamicTaskPool::new(config);

    let first = PageRequest {
        number: 1,
        total: args.count,
        per_page: args.per_page,
        delay: Duration::from_millis(args.delay_ms),
        fail_page: args.fail_page,
    };
    pool.add(page_task(first))?;

    let mut pages = 0_u64;
    let mut items = Vec::new();
    let mut failures = 0_u64;

    let mut stream = pool.stream()?;
    while let Some(result) = stream.next() {
        match result.outcome {
            Ok(page) => {
                pages += 1;
                output.verbose(&format!("[{}] Found {} items", result.name, page.items.len()));
                items.extend(page.items);

                if let Some(number) = page.next {
                    stream.add(page_task(PageRequest { number, ..first }));
                }
            }
            Err(failure) => {
                failures += 1;
                output.error(&format!("Error fetching {}: {}", result.name, failure));
            }
        }
    }
    drop(stream);
    pool.shutdown();

    output.success(&format!("Fetched {} pages, {} items", pages, items.len()));
    if let Some(sample) = items.first() {
        output.info(&format!("First item: {sample}"));
    }
    if failures > 0 {
        output.warning(&format!("{failures} page(s) failed"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(number: u32, total: u32) -> PageRequest {
        PageRequest {
            number,
            total,
            per_page: 2,
            delay: Duration::ZERO,
            fail_page: None,
        }
    }

    #[test]
    fn test_fetch_page_links_to_next() {
        let page = fetch_page(request(1, 3)).unwrap();
        assert_eq!(page.items, vec!["item-1-1", "item-1-2"]);
        assert_eq!(page.next, Some(2));

        let last = fetch_page(request(3, 3)).unwrap();
        assert_eq!(last.next, None);
    }

    #[test]
    fn test_fetch_page_failure() {
        let failing = PageRequest {
            fail_page: Some(2),
            ..request(2, 3)
        };
        let err = fetch_page(failing).unwrap_err();
        assert_eq!(err.to_string(), "page 2 is unavailable");
    }

    #[test]
    fn test_page_task_weight_and_name() {
        let task = page_task(request(4, 9));
        assert_eq!(task.name_str(), "Page-4");
        assert_eq!(task.weight_value(), 2);
    }
}
