pub mod mask_image_segmenter;
