pub mod image_dir_sample_store;
