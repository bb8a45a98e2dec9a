use std::fmt;

/// Width of the frame the calibrated rectangles were measured in.
pub const REFERENCE_WIDTH: u32 = 1080;
/// Height of the frame the calibrated rectangles were measured in.
pub const REFERENCE_HEIGHT: u32 = 1440;

/// Handwritten annotation fields next to the identity document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandwrittenField {
    ComingFrom,
    GoingTo,
    MobileNumber,
    VehicleNumber,
    RoomNumber,
}

impl HandwrittenField {
    pub const ALL: [HandwrittenField; 5] = [
        HandwrittenField::ComingFrom,
        HandwrittenField::GoingTo,
        HandwrittenField::MobileNumber,
        HandwrittenField::VehicleNumber,
        HandwrittenField::RoomNumber,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HandwrittenField::ComingFrom => "Coming From",
            HandwrittenField::GoingTo => "Going To",
            HandwrittenField::MobileNumber => "Mobile Number",
            HandwrittenField::VehicleNumber => "Vehicle Number",
            HandwrittenField::RoomNumber => "Room Number",
        }
    }
}

impl fmt::Display for HandwrittenField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies which document region a buffer or result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionTag {
    IdentityBlock,
    Handwritten(HandwrittenField),
}

impl fmt::Display for RegionTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegionTag::IdentityBlock => write!(f, "Identity Block"),
            RegionTag::Handwritten(field) => write!(f, "{}", field),
        }
    }
}

/// Rectangle in reference coordinates (right/bottom exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl ReferenceRect {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        ReferenceRect { left, top, right, bottom }
    }

    pub fn is_within_reference(&self) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && self.right <= REFERENCE_WIDTH
            && self.bottom <= REFERENCE_HEIGHT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionDescriptor {
    pub tag: RegionTag,
    pub rect: ReferenceRect,
}

/// A descriptor mapped onto a concrete image, always non-empty and in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The one document layout the scanner is calibrated for.
pub struct DocumentLayout;

impl DocumentLayout {
    pub const IDENTITY_BLOCK: RegionDescriptor = RegionDescriptor {
        tag: RegionTag::IdentityBlock,
        rect: ReferenceRect::new(50, 50, 1030, 750),
    };

    pub const HANDWRITTEN: [RegionDescriptor; 5] = [
        RegionDescriptor {
            tag: RegionTag::Handwritten(HandwrittenField::ComingFrom),
            rect: ReferenceRect::new(50, 800, 500, 900),
        },
        RegionDescriptor {
            tag: RegionTag::Handwritten(HandwrittenField::GoingTo),
            rect: ReferenceRect::new(500, 800, 1030, 900),
        },
        RegionDescriptor {
            tag: RegionTag::Handwritten(HandwrittenField::MobileNumber),
            rect: ReferenceRect::new(50, 920, 300, 1000),
        },
        RegionDescriptor {
            tag: RegionTag::Handwritten(HandwrittenField::VehicleNumber),
            rect: ReferenceRect::new(300, 920, 650, 1000),
        },
        RegionDescriptor {
            tag: RegionTag::Handwritten(HandwrittenField::RoomNumber),
            rect: ReferenceRect::new(650, 920, 1030, 1000),
        },
    ];

    /// Map a reference rectangle onto a `target_width` x `target_height` image.
    ///
    /// Each axis is scaled independently and rounded to the nearest pixel, then
    /// clipped so the result is at least 1x1 and inside `[0, width) x [0, height)`.
    /// Zero target dimensions are treated as 1.
    pub fn scale(rect: &ReferenceRect, target_width: u32, target_height: u32) -> ScaledRegion {
        let width = i64::from(target_width.max(1));
        let height = i64::from(target_height.max(1));
        let sx = width as f64 / f64::from(REFERENCE_WIDTH);
        let sy = height as f64 / f64::from(REFERENCE_HEIGHT);

        let left = (f64::from(rect.left) * sx).round() as i64;
        let top = (f64::from(rect.top) * sy).round() as i64;
        let right = (f64::from(rect.right) * sx).round() as i64;
        let bottom = (f64::from(rect.bottom) * sy).round() as i64;

        let left = left.clamp(0, width - 1);
        let top = top.clamp(0, height - 1);
        let right = right.clamp(1, width);
        let bottom = bottom.clamp(1, height);

        ScaledRegion {
            x: left as u32,
            y: top as u32,
            width: (right - left).max(1) as u32,
            height: (bottom - top).max(1) as u32,
        }
    }
}
