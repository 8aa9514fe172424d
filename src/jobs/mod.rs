pub mod feed_refresh;
