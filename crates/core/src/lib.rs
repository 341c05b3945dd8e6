//! Penalty-kick role classification: labels the striker, goalkeeper and
//! referees in video frames from OpenPose BODY_25 keypoints and a goal
//! rectangle.

pub mod annotation {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure;
}

pub mod background {
    pub mod domain {
        pub mod background_filter;
    }
    pub mod infrastructure;
}

pub mod classification {
    pub mod domain {
        pub mod bounding_box;
        pub mod classification_error;
        pub mod classifier_config;
        #[cfg(test)]
        pub(crate) mod fixtures;
        pub mod goalkeeper_selector;
        pub mod goalpost;
        pub mod role_classifier;
        pub mod striker_selector;
        pub mod validity_filter;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod annotate_image_use_case;
    pub mod annotate_video_use_case;
    pub mod frame_processor;
    pub mod frame_report;
    pub mod infrastructure;
    pub mod pipeline_executor;
    pub mod pipeline_logger;
    #[cfg(test)]
    pub(crate) mod test_support;
}

pub mod pose {
    pub mod domain {
        pub mod keypoint;
        pub mod pose_estimator;
    }
    pub mod infrastructure;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod image_writer;
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure;
}
