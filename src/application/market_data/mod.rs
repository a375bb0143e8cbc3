pub mod history_fetcher;

pub use history_fetcher::HistoryFetcher;
