//! Browser-driven scrapers.
//!
//! | Module | Drives | Produces |
//! |--------|--------|----------|
//! | [`portal`] | the research portal's publication table | [`ScrapedRow`](crate::models::ScrapedRow)s for one search |
//! | [`citation`] | a single citation page | a fetchable article URL, or nothing |
//!
//! Both work on a [`Page`](crate::browser::Page) and never fail a whole run:
//! missing elements and timeouts become empty or not-found results.

pub mod citation;
pub mod portal;
