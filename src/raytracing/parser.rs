//! Loader for the plain text scene description.
//!
//! ```text
//! # comments run until the end of the line
//! size 512 512
//! camera from (0, 0, -20) to (0, 0, 0) distance 400 up (0, 1, 0)
//! sphere (0, -520, 0) 500 emissive: (0.8, 0.72, 0.56)
//! sphere (-6, 0, 20) 6 diffuse: blue
//! sphere (8, 0, 20) 8 specular: white
//! ```

use std::fmt;

use thiserror::Error;

use super::{
    camera::Camera,
    core::{Scene, Sphere},
    material::Material,
    Color, Vec3,
};

pub struct SceneParser {
    content: Vec<char>,
    buffer: String,
    position: FilePosition,
    token_start: FilePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FilePosition {
    line: u32,
    column: u32,
    index: u32,
}

impl FilePosition {
    fn new() -> Self {
        FilePosition {
            line: 0,
            column: 0,
            index: 0,
        }
    }

    fn on_new_line(self: &mut Self) {
        self.line += 1;
        self.column = 0;
        self.index += 1;
    }

    fn advance(self: &mut Self) {
        self.column += 1;
        self.index += 1;
    }
}

impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("{message} at {position}")]
pub struct ParserError {
    position: FilePosition,
    pub message: String,
}

impl ParserError {
    fn new(message: &str, position: FilePosition) -> ParserError {
        ParserError {
            position,
            message: message.to_string(),
        }
    }

    /// The offending source line with a caret under the error column.
    pub fn error_location(self: &Self, content: &str) -> Option<String> {
        let line = content.lines().nth(self.position.line as usize)?;
        let spacing = " ".repeat(self.position.column as usize);
        Some(format!("{}\n{}^", line, spacing))
    }
}

type ParserResult<T> = Result<T, ParserError>;

/// Everything a scene file describes.
#[derive(Debug)]
pub struct SceneDescription {
    /// Image size from the `size` header, when present.
    pub size: Option<(u32, u32)>,
    pub camera: Camera,
    pub scene: Scene,
}

impl SceneParser {
    pub fn new(content: &str) -> SceneParser {
        SceneParser {
            content: content.chars().collect(),
            position: FilePosition::new(),
            token_start: FilePosition::new(),
            buffer: String::new(),
        }
    }

    fn get_current_char(self: &Self) -> Option<char> {
        self.content.get(self.position.index as usize).copied()
    }

    fn is_empty(self: &mut Self) -> bool {
        self.peek().is_empty()
    }

    fn advance(self: &mut Self) {
        if let Some(current_char) = self.get_current_char() {
            if current_char == '\n' {
                self.position.on_new_line();
            } else {
                self.position.advance();
            }
        }
    }

    fn eat_spaces(self: &mut Self) {
        // consume empty lines, spaces and comments before the next token
        while let Some(current_char) = self.get_current_char() {
            if current_char == '#' {
                // the end of line is consumed at the end of the loop
                while let Some(c) = self.get_current_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else if !current_char.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    /// Pushes the current char to `result` and returns the next one.
    fn enqueue(self: &mut Self, result: &mut String) -> Option<char> {
        if let Some(current_char) = self.get_current_char() {
            result.push(current_char);
            self.advance();
        }
        self.get_current_char()
    }

    fn pop(self: &mut Self) -> String {
        // a peeked token is returned first
        if !self.buffer.is_empty() {
            return std::mem::take(&mut self.buffer);
        }

        self.eat_spaces();
        self.token_start = self.position;
        let mut result = String::new();
        let Some(current_char) = self.get_current_char() else {
            return result;
        };

        match current_char {
            ',' | '(' | ')' | ':' => {
                self.advance();
                result.push(current_char);
            }
            '.' | '+' | '-' | '0'..='9' => {
                let mut next = Some(current_char);
                if current_char == '+' || current_char == '-' {
                    next = self.enqueue(&mut result);
                }
                while next.is_some_and(|c| c.is_ascii_digit()) {
                    next = self.enqueue(&mut result);
                }
                if next == Some('.') {
                    next = self.enqueue(&mut result);
                    while next.is_some_and(|c| c.is_ascii_digit()) {
                        next = self.enqueue(&mut result);
                    }
                }
            }
            c if c.is_alphabetic() => {
                let mut next = Some(c);
                while next.is_some_and(|c| c.is_alphabetic()) {
                    next = self.enqueue(&mut result);
                }
            }
            _ => {
                // unknown symbol, returned alone so the caller can report it
                self.advance();
                result.push(current_char);
            }
        }
        result
    }

    fn peek(self: &mut Self) -> &String {
        if self.buffer.is_empty() {
            self.buffer = self.pop();
        }
        &self.buffer
    }

    fn error<T>(self: &Self, message: &str) -> ParserResult<T> {
        Err(ParserError::new(message, self.token_start))
    }

    fn parse_float(self: &mut Self) -> ParserResult<f64> {
        let next_token = self.pop();
        match next_token.parse::<f64>() {
            Ok(num) if num.is_finite() => Ok(num),
            Ok(_) => self.error(&format!("'{}' must be a finite number", next_token)),
            Err(_) => self.error(&format!("cannot interpret '{}' as a number", next_token)),
        }
    }

    fn parse_dimension(self: &mut Self) -> ParserResult<u32> {
        let value = self.parse_float()?;
        if value < 1.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return self.error(&format!("image size must be a positive integer, got {}", value));
        }
        Ok(value as u32)
    }

    fn match_token(self: &mut Self, expected_lexem: &str) -> ParserResult<()> {
        let next_lexem = self.pop();
        if next_lexem != expected_lexem {
            self.error(&format!(
                "expected '{}', getting '{}' instead",
                expected_lexem, next_lexem
            ))
        } else {
            Ok(())
        }
    }

    /// Consumes the next lexem only when it is the expected one.
    fn maybe_match(self: &mut Self, expected_lexem: &str) -> bool {
        if *self.peek() == expected_lexem {
            self.pop();
            return true;
        }
        false
    }

    fn parse_header(self: &mut Self) -> ParserResult<Option<(u32, u32)>> {
        if !self.maybe_match("size") {
            return Ok(None);
        }
        let width = self.parse_dimension()?;
        let height = self.parse_dimension()?;
        Ok(Some((width, height)))
    }

    fn parse_vec3(self: &mut Self) -> ParserResult<Vec3> {
        self.match_token("(")?;
        let x = self.parse_float()?;
        self.match_token(",")?;
        let y = self.parse_float()?;
        self.match_token(",")?;
        let z = self.parse_float()?;
        self.match_token(")")?;
        Ok(Vec3::new(x, y, z))
    }

    fn parse_color(self: &mut Self) -> ParserResult<Color> {
        const NAMED: [(&str, [f64; 3]); 8] = [
            ("red", [1.0, 0.0, 0.0]),
            ("green", [0.0, 1.0, 0.0]),
            ("blue", [0.0, 0.0, 1.0]),
            ("white", [1.0, 1.0, 1.0]),
            ("black", [0.0, 0.0, 0.0]),
            ("yellow", [1.0, 1.0, 0.0]),
            ("orange", [0.98, 0.45, 0.02]),
            ("cyan", [0.0, 1.0, 1.0]),
        ];
        for (name, value) in NAMED {
            if self.maybe_match(name) {
                return Ok(value.into());
            }
        }
        let start = self.peek().clone();
        if start != "(" {
            return self.error(&format!("expected a color, getting '{}' instead", start));
        }
        let color = self.parse_vec3()?;
        if color.x < 0.0 || color.y < 0.0 || color.z < 0.0 {
            return self.error("color components must not be negative");
        }
        Ok(color)
    }

    fn parse_material(self: &mut Self) -> ParserResult<Material> {
        if self.maybe_match("specular") {
            self.match_token(":")?;
            let albedo = self.parse_color()?;
            Ok(Material::Specular { albedo })
        } else if self.maybe_match("emissive") {
            self.match_token(":")?;
            let radiance = self.parse_color()?;
            Ok(Material::Emissive { radiance })
        } else {
            if self.maybe_match("diffuse") {
                self.match_token(":")?;
            }
            let albedo = self.parse_color()?;
            Ok(Material::Diffuse { albedo })
        }
    }

    fn parse_sphere(self: &mut Self) -> ParserResult<Sphere> {
        self.match_token("sphere")?;
        let center = self.parse_vec3()?;
        let radius = self.parse_float()?;
        if radius <= 0.0 {
            return self.error("sphere radius must be positive");
        }
        let material = self.parse_material()?;
        Ok(Sphere::new(center, radius, material))
    }

    fn parse_camera(&mut self) -> ParserResult<Camera> {
        if !self.maybe_match("camera") {
            return Ok(Camera::look_at(Vec3::zero(), Vec3::z_axis()));
        }
        let position = if self.maybe_match("from") {
            self.parse_vec3()?
        } else {
            Vec3::zero()
        };
        let point = if self.maybe_match("to") {
            self.parse_vec3()?
        } else {
            position + Vec3::z_axis()
        };
        if (point - position).squared_len() == 0.0 {
            return self.error("camera cannot look at its own position");
        }
        let mut camera = Camera::look_at(position, point);
        if self.maybe_match("distance") {
            let distance = self.parse_float()?;
            if distance <= 0.0 {
                return self.error("view distance must be positive");
            }
            camera.set_view_distance(distance);
        }
        if self.maybe_match("up") {
            let up = self.parse_vec3()?;
            if up.cross(point - position).squared_len() == 0.0 {
                return self.error("up vector cannot be parallel to the view direction");
            }
            camera.set_up(up);
        }
        Ok(camera)
    }

    /// Parses the whole file.
    pub fn parse_scene(self: &mut Self) -> ParserResult<SceneDescription> {
        let size = self.parse_header()?;
        let camera = self.parse_camera()?;

        let mut objects = Vec::new();
        while !self.is_empty() {
            let next_token = self.peek().clone();
            match next_token.as_str() {
                "sphere" => objects.push(self.parse_sphere()?),
                _ => return self.error(&format!("unexpected token '{}'", next_token)),
            }
        }
        if objects.is_empty() {
            return self.error("the scene contains no sphere");
        }
        Ok(SceneDescription {
            size,
            camera,
            scene: Scene::new(objects),
        })
    }
}
