pub mod avframe;
pub mod packet;
