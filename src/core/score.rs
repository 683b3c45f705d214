use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            ScoreTier::Excellent
        } else if score >= 60 {
            ScoreTier::Good
        } else if score >= 40 {
            ScoreTier::Fair
        } else {
            ScoreTier::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "excellent",
            ScoreTier::Good => "good",
            ScoreTier::Fair => "fair",
            ScoreTier::Poor => "poor",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "#10b981",
            ScoreTier::Good => "#3b82f6",
            ScoreTier::Fair => "#f59e0b",
            ScoreTier::Poor => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInfo {
    pub tier: ScoreTier,
    pub message: &'static str,
    pub icon: &'static str,
}

pub fn classify(score: u8) -> ScoreInfo {
    let tier = ScoreTier::from_score(score);
    let (message, icon) = match tier {
        ScoreTier::Excellent => ("Excellent! Your resume is highly ATS-compatible.", "🎉"),
        ScoreTier::Good => ("Good! Some improvements can make it even better.", "👍"),
        ScoreTier::Fair => ("Fair. Follow our suggestions to improve significantly.", "⚠️"),
        ScoreTier::Poor => ("Needs work. Your resume needs significant improvements.", "❌"),
    };

    ScoreInfo {
        tier,
        message,
        icon,
    }
}

pub const RING_RADIUS: f64 = 70.0;

/// Circular progress ring drawn around the score label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRing {
    pub displayed: u8,
}

impl ScoreRing {
    pub fn new(displayed: u8) -> Self {
        Self {
            displayed: displayed.min(100),
        }
    }

    pub fn circumference() -> f64 {
        2.0 * PI * RING_RADIUS
    }

    pub fn sweep_fraction(&self) -> f64 {
        f64::from(self.displayed) / 100.0
    }

    /// Stroke dash offset for an SVG circle of [`RING_RADIUS`].
    pub fn dash_offset(&self) -> f64 {
        let circumference = Self::circumference();
        circumference - self.sweep_fraction() * circumference
    }

    /// Ring and label follow the displayed value, not the final score.
    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.displayed)
    }

    pub fn gauge(&self, width: usize) -> String {
        let filled = (self.sweep_fraction() * width as f64).round() as usize;
        let filled = filled.min(width);
        format!(
            "({}{}) {:>3}/100 [{}]",
            "●".repeat(filled),
            "·".repeat(width - filled),
            self.displayed,
            self.tier().label()
        )
    }
}
