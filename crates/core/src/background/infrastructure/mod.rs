pub mod hsv_ground_filter;
