use std::num::IntErrorKind;

use serde::Serialize;

/// Posts per page on every paginated list.
pub const PAGE_SIZE: i64 = 10;

/// Where a page starts and how many rows it holds, resolved against a total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// Requested page as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requested {
    Number(i64),
    /// Absent or not a number.
    Invalid,
    BeyondLast,
    BeforeFirst,
}

fn parse(raw: Option<&str>) -> Requested {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Requested::Invalid;
    };
    match raw.parse::<i64>() {
        Ok(n) => Requested::Number(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Requested::BeyondLast,
            IntErrorKind::NegOverflow => Requested::BeforeFirst,
            _ => Requested::Invalid,
        },
    }
}

/// Splits `count` ordered rows into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    /// An empty result still has one (empty) page.
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Resolves an untrusted page parameter. Never fails: garbage and
    /// anything below 1 give the first page, anything past the end the last.
    pub fn window(&self, raw: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages();
        let number = match parse(raw) {
            Requested::Number(n) => n.clamp(1, num_pages),
            Requested::BeyondLast => num_pages,
            Requested::Invalid | Requested::BeforeFirst => 1,
        };
        PageWindow {
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}

/// One page of results plus the navigation data a list template needs.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<i64>,
    pub previous_page_number: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            per_page: window.per_page,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
            next_page_number: window.has_next().then_some(window.number + 1),
            previous_page_number: window.has_previous().then_some(window.number - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_ten() {
        assert_eq!(PAGE_SIZE, 10);
    }

    #[test]
    fn twenty_five_rows_make_three_pages() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        assert_eq!(paginator.num_pages(), 3);

        let first = paginator.window(Some("1"));
        assert_eq!((first.offset(), first.limit()), (0, 10));
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = paginator.window(Some("3"));
        assert_eq!(last.offset(), 20);
        assert!(!last.has_next());
        assert!(last.has_previous());
    }

    #[test]
    fn missing_or_garbage_gives_first_page() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        for raw in [None, Some(""), Some("  "), Some("abc"), Some("2.5"), Some("1e3")] {
            assert_eq!(paginator.window(raw).number, 1, "raw = {raw:?}");
        }
    }

    #[test]
    fn below_range_gives_first_page() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        assert_eq!(paginator.window(Some("0")).number, 1);
        assert_eq!(paginator.window(Some("-4")).number, 1);
        assert_eq!(paginator.window(Some("-99999999999999999999")).number, 1);
    }

    #[test]
    fn above_range_gives_last_page() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        assert_eq!(paginator.window(Some("4")).number, 3);
        assert_eq!(paginator.window(Some("99999999999999999999")).number, 3);
        assert_eq!(paginator.window(Some(" 2 ")).number, 2);
    }

    #[test]
    fn empty_set_has_one_page() {
        let paginator = Paginator::new(0, PAGE_SIZE);
        let window = paginator.window(Some("5"));
        assert_eq!(window.number, 1);
        assert_eq!(window.num_pages, 1);
        assert!(!window.has_next());
        assert!(!window.has_previous());
    }

    #[test]
    fn page_links() {
        let window = Paginator::new(25, PAGE_SIZE).window(Some("2"));
        let page = Page::new(vec![(); 10], window);
        assert_eq!(page.next_page_number, Some(3));
        assert_eq!(page.previous_page_number, Some(1));
        assert_eq!(page.items.len(), 10);
    }
}
