pub mod gbm_log;
