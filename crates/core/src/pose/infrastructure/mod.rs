pub mod openpose_json_estimator;
