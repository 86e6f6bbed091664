pub(crate) mod caption;
