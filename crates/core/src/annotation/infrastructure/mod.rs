pub mod role_box_annotator;
