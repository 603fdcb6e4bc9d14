use crate::error::GeometryError;

/// Per-plane layout of a 4:2:0 planar picture with unpadded rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanarGeometry {
    pub width: i32,
    pub height: i32,
    pub linesize_y: i32,
    pub linesize_u: i32,
    pub linesize_v: i32,
    pub y_size: usize,
    pub u_size: usize,
}

impl PlanarGeometry {
    pub fn yuv420(width: i32, height: i32) -> Result<Self, GeometryError> {
        if width <= 0 || height <= 0 {
            return Err(GeometryError::Dimensions { width, height });
        }

        let chroma_width = width / 2 + width % 2;
        let chroma_height = height / 2 + height % 2;

        let linesize_y = width;
        let linesize_u = chroma_width;
        let linesize_v = chroma_width;

        Ok(Self {
            width,
            height,
            linesize_y,
            linesize_u,
            linesize_v,
            y_size: linesize_y as usize * height as usize,
            u_size: linesize_u as usize * chroma_height as usize,
        })
    }

    pub fn linesizes(&self) -> [i32; 3] {
        [self.linesize_y, self.linesize_u, self.linesize_v]
    }

    /// Byte offsets of the Y, U and V planes inside a contiguous buffer.
    pub fn plane_offsets(&self) -> [usize; 3] {
        [0, self.y_size, self.y_size + self.u_size]
    }

    /// Bytes needed to hold all three planes back to back.
    pub fn frame_size(&self) -> usize {
        self.y_size + 2 * self.u_size
    }
}

/// An owned raw picture: a single contiguous buffer plus its declared layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPicture {
    pub width: i32,
    pub height: i32,
    pub linesize: [i32; 3],
    pub data: Vec<u8>,
}

impl RawPicture {
    pub fn zeroed(width: i32, height: i32, linesize: [i32; 3], len: usize) -> Self {
        Self {
            width,
            height,
            linesize,
            data: vec![0; len],
        }
    }

    /// A black picture matching `geometry`, sized like a packed 24-bit RGB image.
    pub fn blank(geometry: &PlanarGeometry) -> Self {
        let len = geometry.width as usize * geometry.height as usize * 3;
        Self::zeroed(geometry.width, geometry.height, geometry.linesizes(), len)
    }

    pub fn validate(&self, geometry: &PlanarGeometry) -> Result<(), GeometryError> {
        if self.width != geometry.width {
            return Err(GeometryError::Width {
                expected: geometry.width,
                actual: self.width,
            });
        }
        if self.height != geometry.height {
            return Err(GeometryError::Height {
                expected: geometry.height,
                actual: self.height,
            });
        }
        if self.linesize[0] != geometry.linesize_y {
            return Err(GeometryError::LinesizeY {
                expected: geometry.linesize_y,
                actual: self.linesize[0],
            });
        }
        if self.linesize[1] != geometry.linesize_u {
            return Err(GeometryError::LinesizeU {
                expected: geometry.linesize_u,
                actual: self.linesize[1],
            });
        }
        if self.linesize[2] != geometry.linesize_v {
            return Err(GeometryError::LinesizeV {
                expected: geometry.linesize_v,
                actual: self.linesize[2],
            });
        }

        let [_, u_offset, v_offset] = geometry.plane_offsets();
        let planes = [
            ("Y", u_offset),
            ("U", v_offset),
            ("V", v_offset + geometry.u_size),
        ];
        for (plane, required) in planes {
            if self.data.len() < required {
                return Err(GeometryError::PlaneSize {
                    plane,
                    required,
                    available: self.data.len(),
                });
            }
        }

        Ok(())
    }
}
